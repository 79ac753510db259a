use std::cmp::Ordering;

use chrono::NaiveDateTime;

use crate::segment::SegmentId;
use crate::service_period::ServicePeriod;
use crate::station::StationId;
use crate::train::TrainId;

/// Discriminator tag for an event (§3, §4.1). The discriminant values below
/// double as the tie-break ordinal: lower runs first among events scheduled
/// for the same timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum EventKind {
    ServicePeriodChange = 0,
    TrainDeparture = 1,
    SegmentExit = 2,
    TrainArrival = 3,
    Turnaround = 4,
    SegmentEnter = 5,
    TrainInsertion = 6,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub time: NaiveDateTime,
    pub kind: EventKind,
    pub train: Option<TrainId>,
    pub station: Option<StationId>,
    pub segment: Option<SegmentId>,
    pub period: Option<ServicePeriod>,
    /// Monotonic insertion sequence, used only to break ties between events
    /// of the same kind scheduled for the same timestamp, so that ordering
    /// is deterministic given identical inputs (§4.1).
    pub sequence: u64,
}

impl Event {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: NaiveDateTime,
        kind: EventKind,
        train: Option<TrainId>,
        station: Option<StationId>,
        segment: Option<SegmentId>,
        period: Option<ServicePeriod>,
        sequence: u64,
    ) -> Self {
        Self {
            time,
            kind,
            train,
            station,
            segment,
            period,
            sequence,
        }
    }
}

/// Ordered ascending by `(time, kind, sequence)` so that a `BinaryHeap`
/// wrapped in `std::cmp::Reverse` behaves as the min-priority queue §4.1
/// specifies.
impl Eq for Event {}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.kind == other.kind && self.sequence == other.sequence
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then(self.kind.cmp(&other.kind))
            .then(self.sequence.cmp(&other.sequence))
    }
}
