//! The `Simulation` runner: owns one scheme's topology, scheduler, and
//! bookkeeping, and drives the event loop of §4.1/§5. Grounded on
//! `Simulation`/`EventHandler` in the original implementation, generalised
//! per §9 ("indexed arena", "soft references via flags").

use std::collections::HashSet;
use std::time::Instant;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use config::Configuration;
use demand::RawDemandRecord;
use model::{
    AggregatedDemandEntry, DemandResult, Event, PassengerDemandGroup, Scheme, SchemeMetrics, ServicePeriod, StationId,
    TimetableEntry, TrainId,
};
use sink::SimulationSink;

use crate::demand_seeding;
use crate::error::SimulationError;
use crate::metrics;
use crate::scheduler::Scheduler;
use crate::topology::{self, Topology};

/// The station index of the north terminus, where deployment/withdrawal
/// happen (§4.2, §4.5).
pub const NORTH_TERMINUS: u32 = 1;
/// The depot segment a newly inserted train enters (§4.3 invariant 2).
pub const DEPOT_SEGMENT_START: u32 = 2;

/// The read-write state a single scheme's run needs beyond the read-only
/// `Topology` (§2 "Data flow"): the scheduler, the service-period ladder,
/// withdrawal bookkeeping, and the accumulating outputs of §6.
pub struct Simulation {
    pub(crate) scheme: Scheme,
    pub(crate) topology: Topology,
    pub(crate) scheduler: Scheduler,
    pub(crate) dwell_time_s: i64,
    pub(crate) turnaround_time_s: i64,
    pub(crate) zone_length_m: f64,
    pub(crate) active_headway_minutes: f64,
    pub(crate) active_trains: HashSet<TrainId>,
    pub(crate) trains_to_withdraw_count: u32,
    pub(crate) end_time: NaiveDateTime,
    pub(crate) timetable: Vec<TimetableEntry>,
    pub(crate) completed_demand: Vec<PassengerDemandGroup>,
    pub(crate) arbitration_loop_count: u32,
}

impl Simulation {
    /// Builds the topology, computes per-period headways via the
    /// representative-train loop time (§4.4.2), seeds demand (§4.6), and
    /// schedules the service-period ladder (§4.5). Does not run the loop.
    pub fn new(config: &Configuration, scheme: Scheme, records: Vec<RawDemandRecord>) -> Result<Self, SimulationError> {
        config.validate_for_scheme(scheme)?;

        let mut topology = topology::build(config, scheme);
        let representative_type = topology.trains[0].service_type;
        let loop_time = topology::loop_time_seconds(&topology, config, representative_type)?;
        log::info!("{:?}: loop time {}s for representative type {:?}", scheme, loop_time, representative_type);

        let simulation_date = demand::simulation_date(&records).unwrap_or_else(|| {
            log::warn!("no demand records to establish a simulation date; defaulting to today");
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
        });
        let start_time = simulation_date.and_hms_opt(5, 0, 0).unwrap();
        let end_time = simulation_date.and_hms_opt(22, 0, 0).unwrap();

        let mut service_periods: Vec<ServicePeriod> = config.service_periods.clone();
        service_periods.sort_by_key(|period| period.start_hour);

        let mut scheduler = Scheduler::new();
        for mut period in service_periods {
            let train_count = period.train_count(scheme);
            let headway = topology::headway_minutes(loop_time, train_count);
            period.headway_minutes = Some(headway);
            log::info!("{:?}: period {} headway {:.1}min ({} trains)", scheme, period.name, headway, train_count);

            let period_start = simulation_date.and_hms_opt(0, 0, 0).unwrap() + Duration::hours(period.start_hour as i64);
            let change_time = period_start - Duration::minutes(30);
            scheduler.schedule(change_time, model::EventKind::ServicePeriodChange, None, None, None, Some(period));
        }

        let mut groups = demand_seeding::seed(&topology, scheme, records);
        groups.sort_by_key(|group| group.arrival_time);
        for group in groups {
            let origin = group.origin_station_id;
            topology.station_mut(origin).waiting.push(group);
        }

        Ok(Self {
            scheme,
            topology,
            scheduler,
            dwell_time_s: config.dwell_time as i64,
            turnaround_time_s: config.turnaround_time as i64,
            zone_length_m: config.zone_length,
            active_headway_minutes: 0.0,
            active_trains: HashSet::new(),
            trains_to_withdraw_count: 0,
            end_time,
            timetable: Vec::new(),
            completed_demand: Vec::new(),
            arbitration_loop_count: 0,
        })
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn north_terminus(&self) -> StationId {
        StationId::new(NORTH_TERMINUS)
    }

    /// Trains currently occupying a segment, for the congestion factor
    /// (§4.3).
    pub(crate) fn trains_in_segments(&self) -> u32 {
        self.topology.segments.values().filter(|segment| segment.occupied_by.is_some()).count() as u32
    }

    /// Pending `train_arrival` events at the north terminus for a
    /// northbound train, for the headway-multiplier station-1 bump (§4.3).
    pub(crate) fn upcoming_northbound_arrivals_at_north_terminus(&self) -> u32 {
        let north_terminus = self.north_terminus();
        self.scheduler
            .iter()
            .filter(|event| event.kind == model::EventKind::TrainArrival && event.station == Some(north_terminus))
            .filter_map(|event| event.train)
            .filter(|train_id| self.topology.train(*train_id).direction == model::Direction::Northbound)
            .count() as u32
    }

    pub(crate) fn congestion_factor(&self) -> f64 {
        crate::arbiter::congestion_factor(self.trains_in_segments(), self.active_trains.len() as u32)
    }

    pub(crate) fn headway_multiplier(&self) -> f64 {
        crate::arbiter::headway_multiplier(self.congestion_factor(), self.upcoming_northbound_arrivals_at_north_terminus())
    }

    pub(crate) fn record_timetable_entry(&mut self, entry: TimetableEntry) {
        self.timetable.push(entry);
    }

    pub(crate) fn record_completed(&mut self, groups: Vec<PassengerDemandGroup>) {
        self.completed_demand.extend(groups);
    }

    /// Drives the event loop until the queue empties (§4.1, §5). Events at
    /// or past `end_time` are popped but discarded without dispatch.
    pub fn run(&mut self) {
        while let Some(event) = self.scheduler.pop_next() {
            if event.time >= self.end_time {
                continue;
            }
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        use model::EventKind::*;
        match event.kind {
            ServicePeriodChange => crate::service_controller::handle_service_period_change(self, &event),
            TrainArrival => crate::train_state_machine::handle_arrival(self, &event),
            TrainDeparture => crate::train_state_machine::handle_departure(self, &event),
            SegmentEnter => crate::train_state_machine::handle_segment_enter(self, &event),
            SegmentExit => crate::train_state_machine::handle_segment_exit(self, &event),
            Turnaround => crate::train_state_machine::handle_turnaround(self, &event),
            TrainInsertion => crate::train_state_machine::handle_insertion(self, &event),
        }
    }

    /// Runs the scheme to completion and emits the output contracts of §6
    /// to `sink`: timetable, per-passenger-group results, and metrics (the
    /// three operations of the §9 sink interface). Returns the metrics plus
    /// the aggregated-demand view of §6, which has no sink operation of its
    /// own and is reported directly to the caller. Consumes `self` because
    /// the outputs are built by draining accumulated state.
    pub fn run_and_report(mut self, sink: &mut dyn SimulationSink) -> (SchemeMetrics, Vec<AggregatedDemandEntry>) {
        let started = Instant::now();
        self.run();
        let run_duration_ms = started.elapsed().as_millis();

        let scheme = self.scheme;
        let timetable = std::mem::take(&mut self.timetable);
        let completed = std::mem::take(&mut self.completed_demand);

        let demand_results: Vec<DemandResult> = completed
            .iter()
            .map(|group| DemandResult {
                scheme,
                arrival_time_at_origin: group.arrival_time,
                departure_from_origin: group.departure_from_origin_time,
                origin_station_id: group.origin_station_id,
                destination_station_id: group.destination_station_id,
                trip_type: group.trip_type,
                passenger_count: group.passenger_count,
                wait_time_seconds: group.wait_time_s(),
                travel_time_seconds: group.travel_time_s(),
            })
            .collect();

        let capacity = self.topology.spec.capacity;
        let scheme_metrics = metrics::summarise(scheme, &timetable, &completed, capacity, run_duration_ms);
        let aggregated = metrics::aggregate_demand(scheme, &demand_results);

        sink.persist_timetable(scheme, timetable);
        sink.persist_demand_results(scheme, demand_results);
        sink.persist_metrics(scheme, scheme_metrics.clone());

        (scheme_metrics, aggregated)
    }
}
