use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which of the two service schemes a simulation run evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Scheme {
    #[serde(rename = "REGULAR")]
    Regular,
    #[serde(rename = "SKIP-STOP")]
    SkipStop,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Regular => "REGULAR",
            Scheme::SkipStop => "SKIP-STOP",
        }
    }
}

/// The station-type / train-service-type lattice of the skip-stop scheme.
/// Under the regular scheme every station and every train is `Ab`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ServiceType {
    A,
    B,
    #[serde(rename = "AB")]
    Ab,
}

impl ServiceType {
    /// Whether a train of `self` service type stops at a station of `station_type`.
    pub fn stops_at(self, station_type: ServiceType) -> bool {
        self == ServiceType::Ab || station_type == ServiceType::Ab || self == station_type
    }
}

/// Direction of travel along the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Direction {
    Southbound,
    Northbound,
}

impl Direction {
    pub fn flipped(self) -> Direction {
        match self {
            Direction::Southbound => Direction::Northbound,
            Direction::Northbound => Direction::Southbound,
        }
    }
}
