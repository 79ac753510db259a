use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::Serialize;

use crate::scheme::{Direction, ServiceType};
use crate::station::StationId;
use crate::train::TrainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrainStatus {
    Active,
    Inactive,
}

/// One row of the per-train timetable output (§3, §6).
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TimetableEntry {
    pub train_id: TrainId,
    pub service_type: ServiceType,
    pub station_id: StationId,
    pub direction: Direction,
    pub arrival_time: NaiveDateTime,
    pub departure_time: NaiveDateTime,
    pub travel_time_seconds: i64,
    pub boarded: u32,
    pub alighted: u32,
    pub station_waiting_count: usize,
    pub train_occupancy: u32,
    pub train_status: TrainStatus,
}
