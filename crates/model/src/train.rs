use std::sync::Arc;

use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::Serialize;
use utility::id::{HasId, Id};

use crate::demand::PassengerDemandGroup;
use crate::scheme::{Direction, ServiceType};
use crate::station::StationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub struct TrainMarker;

impl HasId for TrainMarker {
    type IdType = u32;
}

pub type TrainId = Id<TrainMarker>;

/// Physical characteristics shared by a fleet. Speeds are stored in m/s,
/// already converted from the km/h config input (§3, §6).
#[derive(Debug, Clone, Copy, Serialize, JsonSchema)]
pub struct TrainSpec {
    pub capacity: u32,
    pub cruising_speed_mps: f64,
    pub passthrough_speed_mps: f64,
    pub acceleration_mps2: f64,
    pub deceleration_mps2: f64,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Train {
    pub id: TrainId,
    #[serde(skip)]
    pub spec: Arc<TrainSpec>,
    pub service_type: ServiceType,
    pub direction: Direction,
    pub current_station: Option<StationId>,
    pub is_active: bool,
    #[serde(skip)]
    pub boarded: Vec<PassengerDemandGroup>,
    pub current_passenger_count: u32,
    pub current_speed_mps: f64,
    #[serde(skip)]
    pub arrival_time: Option<NaiveDateTime>,
    #[serde(skip)]
    pub last_departure_time: Option<NaiveDateTime>,
    /// Seconds of segment traversal accumulated since the last recorded
    /// departure; reset to zero on every departure/turnaround record.
    pub current_journey_travel_time_s: i64,
}

impl Train {
    pub fn new(id: TrainId, spec: Arc<TrainSpec>, service_type: ServiceType) -> Self {
        Self {
            id,
            spec,
            service_type,
            direction: Direction::Southbound,
            current_station: None,
            is_active: false,
            boarded: Vec::new(),
            current_passenger_count: 0,
            current_speed_mps: 0.0,
            arrival_time: None,
            last_departure_time: None,
            current_journey_travel_time_s: 0,
        }
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.spec.capacity.saturating_sub(self.current_passenger_count)
    }

    pub fn load_factor(&self) -> f64 {
        if self.spec.capacity == 0 {
            0.0
        } else {
            self.current_passenger_count as f64 / self.spec.capacity as f64
        }
    }

    pub fn board(&mut self, mut group: PassengerDemandGroup) {
        self.current_passenger_count += group.passenger_count;
        group.train_id = Some(self.id);
        self.boarded.push(group);
    }

    pub fn change_direction(&mut self) {
        self.direction = self.direction.flipped();
    }
}
