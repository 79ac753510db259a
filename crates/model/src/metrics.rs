use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::Serialize;

use crate::demand::TripType;
use crate::scheme::Scheme;
use crate::station::StationId;

/// Per-passenger-group output record (§6).
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct DemandResult {
    pub scheme: Scheme,
    pub arrival_time_at_origin: NaiveDateTime,
    pub departure_from_origin: Option<NaiveDateTime>,
    pub origin_station_id: StationId,
    pub destination_station_id: StationId,
    pub trip_type: TripType,
    pub passenger_count: u32,
    pub wait_time_seconds: Option<i64>,
    pub travel_time_seconds: Option<i64>,
}

/// The three demand-aggregation windows of §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandBucket {
    FullService,
    AmPeak,
    PmPeak,
}

impl DemandBucket {
    /// Buckets a time-of-day (as hour + fractional minutes) into
    /// AM_PEAK [07:00,09:00), PM_PEAK [17:00,19:00), else FULL_SERVICE.
    pub fn classify(time: NaiveDateTime) -> DemandBucket {
        use chrono::Timelike;
        let minutes_of_day = time.hour() * 60 + time.minute();
        if (7 * 60..9 * 60).contains(&minutes_of_day) {
            DemandBucket::AmPeak
        } else if (17 * 60..19 * 60).contains(&minutes_of_day) {
            DemandBucket::PmPeak
        } else {
            DemandBucket::FullService
        }
    }
}

/// One row of the aggregated demand output: a count for one O-D pair within
/// one bucket, for one scheme (§6).
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AggregatedDemandEntry {
    pub scheme: Scheme,
    pub bucket: DemandBucket,
    pub origin_station_id: StationId,
    pub destination_station_id: StationId,
    pub passenger_count: u64,
}

/// Per-scheme totals and derived averages (§6).
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SchemeMetrics {
    pub scheme: Scheme,
    pub total_boarded: u64,
    pub total_wait_time_seconds: i64,
    pub total_travel_time_seconds: i64,
    pub completed_groups: u64,
    pub average_load_factor: f64,
    pub run_duration_ms: u128,
}

impl SchemeMetrics {
    pub fn average_wait_time_seconds(&self) -> f64 {
        if self.completed_groups == 0 {
            0.0
        } else {
            self.total_wait_time_seconds as f64 / self.completed_groups as f64
        }
    }

    pub fn average_travel_time_seconds(&self) -> f64 {
        if self.completed_groups == 0 {
            0.0
        } else {
            self.total_travel_time_seconds as f64 / self.completed_groups as f64
        }
    }
}
