//! Train State Machine (§4.4): arrival, departure, segment traversal, and
//! terminus turnaround, plus depot insertion and withdrawal gating. Grounded
//! on `Train`'s event handlers and `TrackSegment.enter` in the original
//! implementation; the resource-arbiter conflict resolution follows §4.3.

use chrono::{Duration, NaiveDateTime};
use model::{Direction, Event, EventKind, SegmentId, StationId, TimetableEntry, TrainId, TrainStatus};

use crate::arbiter;
use crate::motion;
use crate::passenger_exchange::{self, ExchangeOutcome};
use crate::simulation::Simulation;

/// Fixed depot-segment traversal time for a newly inserted train (§4.4).
const DEPOT_TRAVERSAL_SECONDS: i64 = 60;
/// The multiplier applied to active headway when a held resource has no
/// discoverable clearance event to anchor on; §4.3 specifies this fallback
/// only for the segment-held branch ("a reduced departure multiplier") and
/// leaves its exact value to the implementation.
const REDUCED_DEPARTURE_MULTIPLIER: f64 = 0.5;
/// A reschedule loop that never converges is abandoned after this many
/// 3-second steps rather than spinning forever (§4.3 "up to a cap").
const MAX_CONFLICT_ADVANCE_STEPS: u32 = 200;

pub fn handle_arrival(sim: &mut Simulation, event: &Event) {
    let train_id = event.train.expect("train_arrival carries a train");
    let station_id = event.station.expect("train_arrival carries a station");
    let t = event.time;

    if !sim.topology.train(train_id).is_active {
        return;
    }

    let direction = sim.topology.train(train_id).direction;
    {
        let (station, train) = sim.topology.station_and_train_mut(station_id, train_id);
        train.current_station = Some(station_id);
        train.arrival_time = Some(t);
        station.platforms.occupy(direction, train_id);
    }

    if station_id == sim.north_terminus() && direction == Direction::Northbound && sim.trains_to_withdraw_count > 0 {
        withdraw(sim, train_id, station_id, t);
        return;
    }

    if sim.topology.station(station_id).is_terminus {
        sim.scheduler
            .schedule(t + Duration::seconds(sim.dwell_time_s), EventKind::Turnaround, Some(train_id), Some(station_id), None, None);
        return;
    }

    let service_type = sim.topology.train(train_id).service_type;
    let should_stop = sim.topology.station(station_id).should_stop(service_type);
    let departure_time = if should_stop { t + Duration::seconds(sim.dwell_time_s) } else { t };
    sim.scheduler
        .schedule(departure_time, EventKind::TrainDeparture, Some(train_id), Some(station_id), None, None);
}

/// Withdraws a train at the north terminus (§4.5): final alight-only
/// exchange, an `inactive` `TimetableEntry`, no further events scheduled.
fn withdraw(sim: &mut Simulation, train_id: TrainId, station_id: StationId, t: NaiveDateTime) {
    sim.trains_to_withdraw_count -= 1;
    sim.active_trains.remove(&train_id);
    sim.topology.train_mut(train_id).is_active = false;

    let direction = sim.topology.train(train_id).direction;
    let service_type = sim.topology.train(train_id).service_type;

    let (alighted, completed) = {
        let (station, train) = sim.topology.station_and_train_mut(station_id, train_id);
        passenger_exchange::alight(station, train, t)
    };
    sim.record_completed(completed);

    let waiting_count = sim.topology.station(station_id).waiting.len();
    let train_occupancy = sim.topology.train(train_id).current_passenger_count;
    let travel_time = sim.topology.train(train_id).current_journey_travel_time_s;
    let departure = t + Duration::seconds(sim.dwell_time_s);

    sim.record_timetable_entry(TimetableEntry {
        train_id,
        service_type,
        station_id,
        direction,
        arrival_time: t,
        departure_time: departure,
        travel_time_seconds: travel_time,
        boarded: 0,
        alighted,
        station_waiting_count: waiting_count,
        train_occupancy,
        train_status: TrainStatus::Inactive,
    });

    sim.topology.station_mut(station_id).platforms.clear(direction);
    log::info!("{:?}: withdrew train {} at station {}", sim.scheme(), train_id, station_id);
}

pub fn handle_departure(sim: &mut Simulation, event: &Event) {
    let train_id = event.train.expect("train_departure carries a train");
    let station_id = event.station.expect("train_departure carries a station");
    let t = event.time;

    if !sim.topology.train(train_id).is_active {
        return;
    }

    let direction = sim.topology.train(train_id).direction;
    let Some(segment_id) = sim.topology.station(station_id).get_next_segment(direction) else {
        log::error!("no outgoing {direction:?} segment from station {station_id} for train {train_id}");
        return;
    };
    let far_station_id = segment_id.end;

    let segment_occupied = sim.topology.segment(segment_id).map(|segment| !segment.is_available()).unwrap_or(true);
    let far_platform_occupant = sim.topology.station(far_station_id).platforms.occupant(direction);

    if segment_occupied || far_platform_occupant.is_some() {
        reschedule_departure(sim, train_id, station_id, segment_id, far_platform_occupant, segment_occupied, t);
        return;
    }

    let service_type = sim.topology.train(train_id).service_type;
    let should_stop = sim.topology.station(station_id).should_stop(service_type);

    let outcome = if should_stop {
        let station_types = sim.topology.station_types();
        let (station, train) = sim.topology.station_and_train_mut(station_id, train_id);
        let arrival_time = train.arrival_time.expect("a departing train has a recorded arrival_time");
        passenger_exchange::exchange(&station_types, station, train, arrival_time, t)
    } else {
        ExchangeOutcome::default()
    };
    let ExchangeOutcome { boarded, alighted, completed } = outcome;
    sim.record_completed(completed);

    let arrival_time = sim.topology.train(train_id).arrival_time.expect("a departing train has a recorded arrival_time");
    let travel_time = sim.topology.train(train_id).current_journey_travel_time_s;
    let waiting_count = sim.topology.station(station_id).waiting.len();
    let train_occupancy = sim.topology.train(train_id).current_passenger_count;

    sim.record_timetable_entry(TimetableEntry {
        train_id,
        service_type,
        station_id,
        direction,
        arrival_time,
        departure_time: t,
        travel_time_seconds: travel_time,
        boarded,
        alighted,
        station_waiting_count: waiting_count,
        train_occupancy,
        train_status: TrainStatus::Active,
    });

    sim.topology.station_mut(station_id).platforms.clear(direction);
    {
        let train = sim.topology.train_mut(train_id);
        train.last_departure_time = Some(t);
        train.current_journey_travel_time_s = 0;
    }

    sim.scheduler
        .schedule(t, EventKind::SegmentEnter, Some(train_id), Some(far_station_id), Some(segment_id), None);
}

/// Computes the adaptive reschedule time of §4.3 for a held departure, then
/// either schedules a retry or drops the event if the reschedule would land
/// on the same timestamp (anti-livelock).
fn reschedule_departure(
    sim: &mut Simulation,
    train_id: TrainId,
    station_id: StationId,
    segment_id: SegmentId,
    far_platform_occupant: Option<TrainId>,
    segment_occupied: bool,
    t: NaiveDateTime,
) {
    let congestion = sim.congestion_factor();
    let buffer = arbiter::buffer_seconds(congestion);

    let mut candidate: Option<NaiveDateTime> = None;

    if segment_occupied {
        let segment_candidate = if let Some(exit_time) = sim.scheduler.earliest_for_segment(EventKind::SegmentExit, segment_id) {
            exit_time + Duration::seconds(buffer)
        } else {
            t + Duration::seconds(arbiter::minutes_to_seconds(sim.active_headway_minutes * REDUCED_DEPARTURE_MULTIPLIER))
        };
        candidate = Some(segment_candidate);
    }

    if let Some(occupant) = far_platform_occupant {
        let platform_candidate = if let Some(departure_time) = sim.scheduler.earliest_for_train(EventKind::TrainDeparture, occupant) {
            departure_time + Duration::seconds(buffer)
        } else {
            t + Duration::seconds(arbiter::minutes_to_seconds(sim.active_headway_minutes * sim.headway_multiplier()))
        };
        candidate = Some(candidate.map_or(platform_candidate, |existing| existing.max(platform_candidate)));
    }

    let mut reschedule_time = candidate.unwrap_or(t);

    let mut steps = 0u32;
    while sim.scheduler.has_conflicting_departure(reschedule_time, station_id, train_id) && steps < MAX_CONFLICT_ADVANCE_STEPS {
        reschedule_time += Duration::seconds(arbiter::reschedule_step_seconds());
        steps += 1;
    }

    let arrival_time = sim.topology.train(train_id).arrival_time.expect("a departing train has a recorded arrival_time");
    let max_departure = arrival_time + Duration::seconds(3 * sim.dwell_time_s);
    if reschedule_time > max_departure {
        reschedule_time = max_departure;
    }

    if reschedule_time == t {
        sim.arbitration_loop_count += 1;
        log::warn!(
            "{:?}: arbitration loop detected for train {} departure at station {}; dropping event",
            sim.scheme(),
            train_id,
            station_id
        );
        return;
    }

    sim.scheduler
        .schedule(reschedule_time, EventKind::TrainDeparture, Some(train_id), Some(station_id), None, None);
}

pub fn handle_segment_enter(sim: &mut Simulation, event: &Event) {
    let train_id = event.train.expect("segment_enter carries a train");
    let far_station_id = event.station.expect("segment_enter carries the destination station");
    let segment_id = event.segment.expect("segment_enter carries a segment");
    let t = event.time;

    if !sim.topology.train(train_id).is_active {
        return;
    }

    let service_type = sim.topology.train(train_id).service_type;
    let stop_at_far_station = sim.topology.station(far_station_id).should_stop(service_type);
    let entry_speed_mps = sim.topology.train(train_id).current_speed_mps;
    let distance_m = sim.topology.segment(segment_id).map(|segment| segment.distance_m).unwrap_or(0.0);
    let traversal = motion::traverse(&sim.topology.spec, entry_speed_mps, distance_m, stop_at_far_station, sim.zone_length_m);

    let occupied = sim
        .topology
        .segment_mut(segment_id)
        .map(|segment| segment.occupy(train_id, t, traversal.seconds))
        .unwrap_or(false);

    if !occupied {
        let congestion = sim.congestion_factor();
        let reschedule_time = if let Some(exit_time) = sim.scheduler.earliest_for_segment(EventKind::SegmentExit, segment_id) {
            exit_time + Duration::seconds(arbiter::buffer_seconds(congestion))
        } else {
            t + Duration::seconds(arbiter::minutes_to_seconds(sim.active_headway_minutes * sim.headway_multiplier()))
        };

        if reschedule_time == t {
            sim.arbitration_loop_count += 1;
            log::warn!("{:?}: arbitration loop detected for train {} segment_enter onto {:?}; dropping event", sim.scheme(), train_id, segment_id);
            return;
        }

        sim.scheduler
            .schedule(reschedule_time, EventKind::SegmentEnter, Some(train_id), Some(far_station_id), Some(segment_id), None);
        return;
    }

    {
        let train = sim.topology.train_mut(train_id);
        train.current_journey_travel_time_s += traversal.seconds;
        train.current_speed_mps = traversal.exit_speed_mps;
    }

    sim.scheduler.schedule(
        t + Duration::seconds(traversal.seconds),
        EventKind::SegmentExit,
        Some(train_id),
        Some(far_station_id),
        Some(segment_id),
        None,
    );
}

pub fn handle_segment_exit(sim: &mut Simulation, event: &Event) {
    let train_id = event.train.expect("segment_exit carries a train");
    let station_id = event.station.expect("segment_exit carries the destination station");
    let segment_id = event.segment.expect("segment_exit carries a segment");
    let t = event.time;

    if !sim.topology.train(train_id).is_active {
        return;
    }

    if let Some(segment) = sim.topology.segment_mut(segment_id) {
        segment.release(t);
    }

    sim.scheduler.schedule(t, EventKind::TrainArrival, Some(train_id), Some(station_id), None, None);
}

pub fn handle_turnaround(sim: &mut Simulation, event: &Event) {
    let train_id = event.train.expect("turnaround carries a train");
    let station_id = event.station.expect("turnaround carries a station");
    let t = event.time;

    if !sim.topology.train(train_id).is_active {
        return;
    }

    let direction = sim.topology.train(train_id).direction;
    let service_type = sim.topology.train(train_id).service_type;
    let should_stop = sim.topology.station(station_id).should_stop(service_type);

    let outcome = if should_stop {
        let station_types = sim.topology.station_types();
        let (station, train) = sim.topology.station_and_train_mut(station_id, train_id);
        let arrival_time = train.arrival_time.expect("an arriving train has a recorded arrival_time");
        passenger_exchange::exchange(&station_types, station, train, arrival_time, t)
    } else {
        ExchangeOutcome::default()
    };
    let ExchangeOutcome { boarded, alighted, completed } = outcome;
    sim.record_completed(completed);

    let arrival_time = sim.topology.train(train_id).arrival_time.expect("an arriving train has a recorded arrival_time");
    let travel_time = sim.topology.train(train_id).current_journey_travel_time_s;
    let waiting_count = sim.topology.station(station_id).waiting.len();
    let train_occupancy = sim.topology.train(train_id).current_passenger_count;

    sim.record_timetable_entry(TimetableEntry {
        train_id,
        service_type,
        station_id,
        direction,
        arrival_time,
        departure_time: t,
        travel_time_seconds: travel_time,
        boarded,
        alighted,
        station_waiting_count: waiting_count,
        train_occupancy,
        train_status: TrainStatus::Active,
    });

    sim.topology.station_mut(station_id).platforms.clear(direction);
    {
        let train = sim.topology.train_mut(train_id);
        // No segment has been traversed since this entry was recorded; avoid
        // reporting the same travel time again on the follow-up departure
        // entry once the train pulls out after turnaround (§9 open question
        // on not double-counting dwell/travel figures across the two
        // entries a terminus visit produces).
        train.current_journey_travel_time_s = 0;
        train.change_direction();
    }

    if t <= sim.end_time {
        let new_arrival = t + Duration::seconds(sim.turnaround_time_s);
        sim.topology.train_mut(train_id).arrival_time = Some(new_arrival);
        sim.scheduler.schedule(
            new_arrival + Duration::seconds(sim.dwell_time_s),
            EventKind::TrainDeparture,
            Some(train_id),
            Some(station_id),
            None,
            None,
        );
    }
}

pub fn handle_insertion(sim: &mut Simulation, event: &Event) {
    let train_id = event.train.expect("train_insertion carries a train");
    let segment_id = event.segment.expect("train_insertion carries the depot segment");
    let t = event.time;

    if !sim.topology.train(train_id).is_active {
        return;
    }

    if sim.scheduler.has_segment_enter_at(t, segment_id) {
        let reschedule_time = t + Duration::seconds(arbiter::minutes_to_seconds(sim.active_headway_minutes));
        reschedule_or_drop_insertion(sim, train_id, segment_id, t, reschedule_time);
        return;
    }

    let north_terminus = sim.north_terminus();
    let platform_occupant = sim.topology.station(north_terminus).platforms.occupant(Direction::Northbound);
    if let Some(occupant) = platform_occupant {
        let congestion = sim.congestion_factor();
        let buffer = arbiter::buffer_seconds(congestion);
        let reschedule_time = if let Some(clearance) = sim.scheduler.earliest_for_train(EventKind::TrainDeparture, occupant) {
            clearance + Duration::seconds(buffer)
        } else {
            t + Duration::seconds(arbiter::minutes_to_seconds(sim.active_headway_minutes * sim.headway_multiplier()))
        };
        reschedule_or_drop_insertion(sim, train_id, segment_id, t, reschedule_time);
        return;
    }

    let segment_occupied = sim.topology.segment(segment_id).map(|segment| !segment.is_available()).unwrap_or(true);
    if segment_occupied {
        let congestion = sim.congestion_factor();
        let buffer = arbiter::buffer_seconds(congestion);
        let reschedule_time = if let Some(exit_time) = sim.scheduler.earliest_for_segment(EventKind::SegmentExit, segment_id) {
            exit_time + Duration::seconds(buffer)
        } else {
            t + Duration::seconds(arbiter::minutes_to_seconds(sim.active_headway_minutes * sim.headway_multiplier()))
        };
        reschedule_or_drop_insertion(sim, train_id, segment_id, t, reschedule_time);
        return;
    }

    let arrival_time = t + Duration::seconds(DEPOT_TRAVERSAL_SECONDS);
    {
        let train = sim.topology.train_mut(train_id);
        train.direction = Direction::Northbound;
        train.arrival_time = Some(arrival_time);
    }
    if let Some(segment) = sim.topology.segment_mut(segment_id) {
        segment.occupy(train_id, t, DEPOT_TRAVERSAL_SECONDS);
    }

    sim.scheduler
        .schedule(arrival_time, EventKind::SegmentExit, Some(train_id), Some(north_terminus), Some(segment_id), None);
}

fn reschedule_or_drop_insertion(sim: &mut Simulation, train_id: TrainId, segment_id: SegmentId, original_time: NaiveDateTime, reschedule_time: NaiveDateTime) {
    if reschedule_time == original_time {
        sim.arbitration_loop_count += 1;
        log::warn!("{:?}: arbitration loop detected for train {} insertion; dropping event", sim.scheme(), train_id);
        return;
    }
    sim.scheduler
        .schedule(reschedule_time, EventKind::TrainInsertion, Some(train_id), None, Some(segment_id), None);
}
