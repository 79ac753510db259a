//! Service Controller (§4.5): fleet sizing at service-period boundaries.
//! Grounded on `_handle_service_period_change` in the original
//! implementation — deployment via the depot segment, deferred withdrawal
//! at the north terminus.

use chrono::{Duration, NaiveDateTime};
use model::{Event, EventKind, SegmentId, StationId, TrainId};

use crate::arbiter;
use crate::simulation::{Simulation, DEPOT_SEGMENT_START, NORTH_TERMINUS};

fn depot_segment_id() -> SegmentId {
    SegmentId::new(StationId::new(DEPOT_SEGMENT_START), StationId::new(NORTH_TERMINUS))
}

/// Sets the active headway, then either deploys new trains (current <
/// target) or marks a surplus for deferred withdrawal (current > target).
pub fn handle_service_period_change(sim: &mut Simulation, event: &Event) {
    let period = event.period.clone().expect("service_period_change carries a period");
    let scheme = sim.scheme();
    let headway = period
        .headway_minutes
        .expect("headway is computed for every period at simulation initialisation");
    sim.active_headway_minutes = headway;

    let target = period.train_count(scheme);
    let current = sim.active_trains.len() as u32;
    log::info!(
        "{:?}: period '{}' begins at {}, headway {:.2}min, current {} -> target {}",
        scheme,
        period.name,
        event.time,
        headway,
        current,
        target
    );

    if current < target {
        deploy(sim, event.time, target - current);
    } else if current > target {
        let surplus = current - target;
        sim.trains_to_withdraw_count += surplus;
        log::info!("{:?}: marking {} train(s) for withdrawal at the north terminus", scheme, surplus);
    }
}

/// Schedules up to `requested` `train_insertion` events, spaced by the
/// congestion-scaled headway and spread factor of §4.5.
fn deploy(sim: &mut Simulation, period_change_time: NaiveDateTime, requested: u32) {
    let free_trains: Vec<TrainId> = sim.topology.trains.iter().filter(|train| !train.is_active).map(|train| train.id).collect();
    let k = requested.min(free_trains.len() as u32) as usize;
    if k == 0 {
        log::warn!("{:?}: {} train(s) requested but none free in the roster", sim.scheme(), requested);
        return;
    }

    let headway_seconds = arbiter::minutes_to_seconds(sim.active_headway_minutes);
    let initial_delay = (2 * 60).max((0.5 * headway_seconds as f64).round() as i64);
    let spread_factor = if k <= 3 { 1.2 } else { 1.5 };

    let mut insertion_time = period_change_time + Duration::seconds(initial_delay);
    let depot_segment = depot_segment_id();

    for (deployed, train_id) in free_trains.into_iter().take(k).enumerate() {
        sim.active_trains.insert(train_id);
        sim.topology.train_mut(train_id).is_active = true;
        sim.scheduler
            .schedule(insertion_time, EventKind::TrainInsertion, Some(train_id), None, Some(depot_segment), None);
        log::info!("{:?}: scheduled insertion of train {} at {}", sim.scheme(), train_id, insertion_time);

        let multiplier = sim.headway_multiplier();
        let step_seconds = (headway_seconds as f64 * multiplier * spread_factor).round() as i64;
        insertion_time += Duration::seconds(step_seconds);
        if (deployed + 1) % 3 == 0 {
            insertion_time += Duration::seconds((0.5 * headway_seconds as f64).round() as i64);
        }
    }
}
