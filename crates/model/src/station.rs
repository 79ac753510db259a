use schemars::JsonSchema;
use serde::Serialize;
use utility::id::{HasId, Id};

use crate::demand::PassengerDemandGroup;
use crate::scheme::{Direction, ServiceType};
use crate::segment::SegmentId;
use crate::train::TrainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub struct StationMarker;

impl HasId for StationMarker {
    type IdType = u32;
}

pub type StationId = Id<StationMarker>;

/// One platform per direction; at most one train occupies a platform at any
/// instant (§3 Station invariant).
#[derive(Debug, Clone, Copy, Default, Serialize, JsonSchema)]
pub struct Platforms {
    pub southbound: Option<TrainId>,
    pub northbound: Option<TrainId>,
}

impl Platforms {
    pub fn occupant(&self, direction: Direction) -> Option<TrainId> {
        match direction {
            Direction::Southbound => self.southbound,
            Direction::Northbound => self.northbound,
        }
    }

    pub fn is_occupied(&self, direction: Direction) -> bool {
        self.occupant(direction).is_some()
    }

    pub fn occupy(&mut self, direction: Direction, train: TrainId) {
        match direction {
            Direction::Southbound => self.southbound = Some(train),
            Direction::Northbound => self.northbound = Some(train),
        }
    }

    pub fn clear(&mut self, direction: Direction) {
        match direction {
            Direction::Southbound => self.southbound = None,
            Direction::Northbound => self.northbound = None,
        }
    }
}

/// An outgoing track handle per direction; `None` at the far terminus in
/// that direction.
#[derive(Debug, Clone, Copy, Default, Serialize, JsonSchema)]
pub struct Tracks {
    pub southbound: Option<SegmentId>,
    pub northbound: Option<SegmentId>,
}

impl Tracks {
    pub fn get(&self, direction: Direction) -> Option<SegmentId> {
        match direction {
            Direction::Southbound => self.southbound,
            Direction::Northbound => self.northbound,
        }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub station_type: ServiceType,
    pub is_terminus: bool,
    pub platforms: Platforms,
    pub tracks: Tracks,
    #[serde(skip)]
    pub waiting: Vec<PassengerDemandGroup>,
}

impl Station {
    pub fn new(id: StationId, name: String, station_type: ServiceType, is_terminus: bool) -> Self {
        Self {
            id,
            name,
            station_type,
            is_terminus,
            platforms: Platforms::default(),
            tracks: Tracks::default(),
            waiting: Vec::new(),
        }
    }

    /// Whether a train of the given service type stops here at all
    /// (§4.2 skip-stop optimisation, §4.6 boarding compatibility rule 1).
    pub fn should_stop(&self, train_service_type: ServiceType) -> bool {
        train_service_type.stops_at(self.station_type)
    }

    pub fn get_next_segment(&self, direction: Direction) -> Option<SegmentId> {
        self.tracks.get(direction)
    }
}
