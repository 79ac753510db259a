//! The injected persistence collaborator (§9: "Process-wide DB client with
//! open-on-import side effects -> injected collaborator"). The core takes a
//! sink by reference and never opens a connection itself.

use model::{DemandResult, Scheme, SchemeMetrics, TimetableEntry};

/// Where a completed run's output goes. Mirrors the shape of
/// `public_transport::database::DatabaseOperations`, minus the `sqlx`/Postgres
/// backing: the simulation core has no durable store in scope, only this
/// interface (see DESIGN.md for the dropped dependency).
///
/// Unlike the teacher's database traits, these operations are not `async`:
/// nothing here performs blocking I/O during the event loop itself (§5), so
/// there is no `async_trait` machinery to carry over.
pub trait SimulationSink {
    fn persist_timetable(&mut self, scheme: Scheme, entries: Vec<TimetableEntry>);

    fn persist_demand_results(&mut self, scheme: Scheme, results: Vec<DemandResult>);

    fn persist_metrics(&mut self, scheme: Scheme, metrics: SchemeMetrics);
}

/// An in-memory sink for tests and for the `runner` binary, which has no
/// durable store to write to and simply reports what it collected.
#[derive(Debug, Default)]
pub struct InMemorySink {
    pub timetables: Vec<(Scheme, Vec<TimetableEntry>)>,
    pub demand_results: Vec<(Scheme, Vec<DemandResult>)>,
    pub metrics: Vec<(Scheme, SchemeMetrics)>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics_for(&self, scheme: Scheme) -> Option<&SchemeMetrics> {
        self.metrics
            .iter()
            .find(|(s, _)| *s == scheme)
            .map(|(_, m)| m)
    }

    pub fn timetable_for(&self, scheme: Scheme) -> Option<&[TimetableEntry]> {
        self.timetables
            .iter()
            .find(|(s, _)| *s == scheme)
            .map(|(_, t)| t.as_slice())
    }
}

impl SimulationSink for InMemorySink {
    fn persist_timetable(&mut self, scheme: Scheme, entries: Vec<TimetableEntry>) {
        log::debug!("persisting {} timetable entries for {:?}", entries.len(), scheme);
        self.timetables.push((scheme, entries));
    }

    fn persist_demand_results(&mut self, scheme: Scheme, results: Vec<DemandResult>) {
        log::debug!("persisting {} demand results for {:?}", results.len(), scheme);
        self.demand_results.push((scheme, results));
    }

    fn persist_metrics(&mut self, scheme: Scheme, metrics: SchemeMetrics) {
        log::debug!("persisting metrics for {:?}: {:?}", scheme, metrics);
        self.metrics.push((scheme, metrics));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::{Direction, ServiceType, TrainStatus};
    use utility::id::Id;

    fn sample_entry() -> TimetableEntry {
        TimetableEntry {
            train_id: Id::new(1),
            service_type: ServiceType::Ab,
            station_id: Id::new(1),
            direction: Direction::Southbound,
            arrival_time: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(5, 0, 0)
                .unwrap(),
            departure_time: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(5, 0, 30)
                .unwrap(),
            travel_time_seconds: 0,
            boarded: 0,
            alighted: 0,
            station_waiting_count: 0,
            train_occupancy: 0,
            train_status: TrainStatus::Active,
        }
    }

    #[test]
    fn remembers_timetables_per_scheme() {
        let mut sink = InMemorySink::new();
        sink.persist_timetable(Scheme::Regular, vec![sample_entry()]);
        assert_eq!(sink.timetable_for(Scheme::Regular).unwrap().len(), 1);
        assert!(sink.timetable_for(Scheme::SkipStop).is_none());
    }
}
