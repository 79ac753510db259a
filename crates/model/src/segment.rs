use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::Serialize;

use crate::scheme::Direction;
use crate::station::StationId;
use crate::train::TrainId;

/// A track segment's identity is the ordered pair of its endpoints;
/// direction is implied by the order (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub struct SegmentId {
    pub start: StationId,
    pub end: StationId,
}

impl SegmentId {
    pub fn new(start: StationId, end: StationId) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TrackSegment {
    pub id: SegmentId,
    pub direction: Direction,
    pub distance_m: f64,
    pub occupied_by: Option<TrainId>,
    #[serde(skip)]
    pub last_entry_time: Option<NaiveDateTime>,
    #[serde(skip)]
    pub last_exit_time: Option<NaiveDateTime>,
    /// Anticipated time at which the segment becomes free again, set on entry.
    #[serde(skip)]
    pub next_available: Option<NaiveDateTime>,
}

impl TrackSegment {
    pub fn new(id: SegmentId, direction: Direction, distance_m: f64) -> Self {
        Self {
            id,
            direction,
            distance_m,
            occupied_by: None,
            last_entry_time: None,
            last_exit_time: None,
            next_available: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.occupied_by.is_none()
    }

    /// Attempts to occupy the segment; mirrors `TrackSegment.enter` in the
    /// original implementation. Returns `false` without mutation if already
    /// occupied.
    pub fn occupy(&mut self, train: TrainId, time: NaiveDateTime, expected_duration_s: i64) -> bool {
        if self.occupied_by.is_some() {
            return false;
        }
        self.occupied_by = Some(train);
        self.last_entry_time = Some(time);
        self.next_available = Some(time + chrono::Duration::seconds(expected_duration_s));
        true
    }

    pub fn release(&mut self, time: NaiveDateTime) {
        self.occupied_by = None;
        self.last_exit_time = Some(time);
    }
}
