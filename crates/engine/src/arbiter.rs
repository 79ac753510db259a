//! The Resource Arbiter's congestion model (§4.3). These are pure
//! functions over counts; the conflict-resolution sequencing itself lives
//! in `simulation.rs`, next to the scheduler state it needs to consult.

const BASE_BUFFER_SECONDS: i64 = 5;
const RESCHEDULE_STEP_SECONDS: i64 = 3;

/// Trains currently in segments over active trains, clamped to at least 1
/// in the denominator (§4.3).
pub fn congestion_factor(trains_in_segments: u32, active_trains: u32) -> f64 {
    trains_in_segments as f64 / active_trains.max(1) as f64
}

/// Escalates the headway multiplier in bands, plus a flat bump for station-1
/// arrival pressure, capped at 1.5 (§4.3).
pub fn headway_multiplier(segment_congestion: f64, upcoming_northbound_arrivals_at_station_one: u32) -> f64 {
    let mut multiplier = 1.0;
    if segment_congestion > 0.7 {
        multiplier = 1.3;
    } else if segment_congestion > 0.5 {
        multiplier = 1.2;
    } else if segment_congestion > 0.3 {
        multiplier = 1.1;
    }
    if upcoming_northbound_arrivals_at_station_one > 2 {
        multiplier += 0.2;
    }
    multiplier.min(1.5)
}

/// Scales the departure-reschedule buffer from a 5-second base by the same
/// congestion bands (§4.3).
pub fn buffer_seconds(segment_congestion: f64) -> i64 {
    let factor = if segment_congestion > 0.7 {
        2.0
    } else if segment_congestion > 0.5 {
        1.5
    } else {
        1.0
    };
    (BASE_BUFFER_SECONDS as f64 * factor).round() as i64
}

pub fn reschedule_step_seconds() -> i64 {
    RESCHEDULE_STEP_SECONDS
}

/// Converts a headway in minutes to whole seconds for scheduling.
pub fn minutes_to_seconds(minutes: f64) -> i64 {
    (minutes * 60.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn congestion_factor_clamps_denominator() {
        assert_eq!(congestion_factor(3, 0), 3.0);
    }

    #[test]
    fn headway_multiplier_escalates_and_caps() {
        assert_eq!(headway_multiplier(0.1, 0), 1.0);
        assert_eq!(headway_multiplier(0.4, 0), 1.1);
        assert_eq!(headway_multiplier(0.6, 0), 1.2);
        assert_eq!(headway_multiplier(0.8, 0), 1.3);
        assert_eq!(headway_multiplier(0.8, 3), 1.5);
    }

    #[test]
    fn buffer_seconds_scales_with_congestion() {
        assert_eq!(buffer_seconds(0.1), 5);
        assert_eq!(buffer_seconds(0.4), 5);
        assert_eq!(buffer_seconds(0.6), 8);
        assert_eq!(buffer_seconds(0.8), 10);
    }

    #[test]
    fn minutes_to_seconds_rounds() {
        assert_eq!(minutes_to_seconds(2.5), 150);
        assert_eq!(minutes_to_seconds(1.0), 60);
    }
}
