//! The segment-traversal motion model (§4.4.1).

use model::TrainSpec;

/// Outcome of traversing one segment: the scheduling duration and the
/// train's speed on exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Traversal {
    pub seconds: i64,
    pub exit_speed_mps: f64,
}

/// Traverses a segment of `length_m`, entering at `entry_speed_mps`, either
/// stopping at the far station or passing through it at `zone_length_m`
/// (§4.4.1). `tau` is rounded down to an integer second for scheduling.
pub fn traverse(spec: &TrainSpec, entry_speed_mps: f64, length_m: f64, stop_at_far_station: bool, zone_length_m: f64) -> Traversal {
    let cruise = spec.cruising_speed_mps;
    let decel = spec.deceleration_mps2;
    let accel = spec.acceleration_mps2;

    if stop_at_far_station {
        let tau_dec = entry_speed_mps / decel;
        let x_dec = (0.5 * decel * tau_dec * tau_dec).min(length_m);
        let tau_acc = cruise / accel;
        let x_acc = 0.5 * accel * tau_acc * tau_acc;
        let tau_cruise = (length_m - x_dec - x_acc).max(0.0) / cruise;
        let tau = tau_dec + tau_acc + tau_cruise;
        Traversal {
            seconds: tau.floor() as i64,
            exit_speed_mps: 0.0,
        }
    } else {
        let pass = spec.passthrough_speed_mps;
        let tau_dec = (entry_speed_mps - pass) / decel;
        let tau_zone = zone_length_m / pass;
        let tau_acc = (cruise - pass) / accel;
        let x_acc = 0.5 * accel * tau_acc * tau_acc;
        let tau_cruise = (length_m - x_acc).max(0.0) / cruise;
        let tau = tau_dec + tau_zone + tau_acc + tau_cruise;
        Traversal {
            seconds: tau.floor() as i64,
            exit_speed_mps: pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TrainSpec {
        TrainSpec {
            capacity: 100,
            cruising_speed_mps: 60.0 * 1000.0 / 3600.0,
            passthrough_speed_mps: 20.0 * 1000.0 / 3600.0,
            acceleration_mps2: 1.0,
            deceleration_mps2: 1.0,
        }
    }

    #[test]
    fn stopping_from_rest_takes_longer_than_passing_through() {
        let stopping = traverse(&spec(), 0.0, 1000.0, true, 130.0);
        let passing = traverse(&spec(), spec().cruising_speed_mps, 1000.0, false, 130.0);
        assert!(stopping.seconds > 0);
        assert_eq!(stopping.exit_speed_mps, 0.0);
        assert_eq!(passing.exit_speed_mps, spec().passthrough_speed_mps);
    }

    #[test]
    fn short_segment_clamps_deceleration_distance() {
        let traversal = traverse(&spec(), 10.0, 5.0, true, 130.0);
        assert!(traversal.seconds >= 0);
    }
}
