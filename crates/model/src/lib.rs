pub mod demand;
pub mod event;
pub mod metrics;
pub mod scheme;
pub mod segment;
pub mod service_period;
pub mod station;
pub mod timetable;
pub mod train;

pub use demand::{DemandStatus, PassengerDemandGroup, TripType};
pub use event::{Event, EventKind};
pub use metrics::{AggregatedDemandEntry, DemandBucket, DemandResult, SchemeMetrics};
pub use scheme::{Direction, Scheme, ServiceType};
pub use segment::{SegmentId, TrackSegment};
pub use service_period::ServicePeriod;
pub use station::{Platforms, Station, StationId, Tracks};
pub use timetable::{TimetableEntry, TrainStatus};
pub use train::{Train, TrainId, TrainSpec};
