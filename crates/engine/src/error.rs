use std::fmt;

use config::ConfigError;
use demand::DemandError;
use model::{Direction, SegmentId, StationId, TrainId};

/// A required segment was absent while walking the line (§4.4.2, §7
/// `TopologyError`). Fatal for the affected scheme.
#[derive(Debug)]
pub enum TopologyError {
    MissingSegment { from: StationId, direction: Direction },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSegment { from, direction } => {
                write!(f, "no {direction:?} segment leaves station {from}")
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// An event referenced a train/platform/segment in a state that should be
/// impossible (§7 `InvariantViolation`). Fatal for the run.
#[derive(Debug)]
pub enum InvariantViolation {
    SegmentOccupantMismatch {
        segment: SegmentId,
        expected: TrainId,
        found: Option<TrainId>,
    },
    PlatformNotOccupiedByTrain {
        station: StationId,
        direction: Direction,
        expected: TrainId,
    },
    TrainHasNoStation {
        train: TrainId,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentOccupantMismatch { segment, expected, found } => write!(
                f,
                "segment {:?} expected occupant {} but found {:?}",
                segment, expected, found
            ),
            Self::PlatformNotOccupiedByTrain { station, direction, expected } => write!(
                f,
                "platform {direction:?} at station {station} expected occupant {expected} but it was empty"
            ),
            Self::TrainHasNoStation { train } => {
                write!(f, "train {train} has no current station while one was required")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Unified error type for a single scheme's run (§7). `ArbitrationLoop` is
/// deliberately not a variant here: per §7 it is logged and the offending
/// event is dropped, the run continues, so it never leaves the engine as an
/// `Err`.
#[derive(Debug)]
pub enum SimulationError {
    Config(ConfigError),
    Demand(DemandError),
    Topology(TopologyError),
    Invariant(InvariantViolation),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(why) => write!(f, "{why}"),
            Self::Demand(why) => write!(f, "{why}"),
            Self::Topology(why) => write!(f, "{why}"),
            Self::Invariant(why) => write!(f, "{why}"),
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<ConfigError> for SimulationError {
    fn from(why: ConfigError) -> Self {
        Self::Config(why)
    }
}

impl From<DemandError> for SimulationError {
    fn from(why: DemandError) -> Self {
        Self::Demand(why)
    }
}

impl From<TopologyError> for SimulationError {
    fn from(why: TopologyError) -> Self {
        Self::Topology(why)
    }
}

impl From<InvariantViolation> for SimulationError {
    fn from(why: InvariantViolation) -> Self {
        Self::Invariant(why)
    }
}
