//! Per-scheme metrics and aggregated-demand bucketing (§6, §9 supplement 2
//! and 5). Grounded on `save_passenger_demand_to_db`'s bucket aggregation
//! and `Train.calculate_load_factor` in the original implementation.

use std::collections::HashMap;

use model::{AggregatedDemandEntry, DemandBucket, DemandResult, PassengerDemandGroup, Scheme, SchemeMetrics, TimetableEntry};

/// Totals and derived averages for one scheme's completed run (§6).
/// `average_load_factor` is the mean, across every recorded timetable
/// entry, of occupancy over the train's snapshot capacity at that stop.
pub fn summarise(
    scheme: Scheme,
    timetable: &[TimetableEntry],
    completed: &[PassengerDemandGroup],
    capacity: u32,
    run_duration_ms: u128,
) -> SchemeMetrics {
    let total_boarded: u64 = timetable.iter().map(|entry| entry.boarded as u64).sum();
    let total_wait_time_seconds: i64 = completed.iter().filter_map(|group| group.wait_time_s()).sum();
    let total_travel_time_seconds: i64 = completed.iter().filter_map(|group| group.travel_time_s()).sum();

    let load_factor_sum: f64 = timetable
        .iter()
        .map(|entry| if capacity == 0 { 0.0 } else { entry.train_occupancy as f64 / capacity as f64 })
        .sum();
    let average_load_factor = if timetable.is_empty() { 0.0 } else { load_factor_sum / timetable.len() as f64 };

    SchemeMetrics {
        scheme,
        total_boarded,
        total_wait_time_seconds,
        total_travel_time_seconds,
        completed_groups: completed.len() as u64,
        average_load_factor,
        run_duration_ms,
    }
}

/// Buckets completed demand results by O-D pair and by {FULL_SERVICE,
/// AM_PEAK, PM_PEAK} (§6 "Aggregated demand output"), keyed off each
/// group's arrival time at origin.
pub fn aggregate_demand(scheme: Scheme, results: &[DemandResult]) -> Vec<AggregatedDemandEntry> {
    let mut buckets: HashMap<(DemandBucket, model::StationId, model::StationId), u64> = HashMap::new();

    // FULL_SERVICE is the unconditional total, not a fourth disjoint window;
    // every result counts into it once, plus again into AM_PEAK/PM_PEAK if it
    // falls into one of those sub-windows, per §6's "{FULL_SERVICE, AM_PEAK,
    // PM_PEAK}" listing alongside the peak sub-windows.
    for result in results {
        let full_service_key = (DemandBucket::FullService, result.origin_station_id, result.destination_station_id);
        *buckets.entry(full_service_key).or_insert(0) += result.passenger_count as u64;

        let bucket = DemandBucket::classify(result.arrival_time_at_origin);
        if bucket != DemandBucket::FullService {
            let key = (bucket, result.origin_station_id, result.destination_station_id);
            *buckets.entry(key).or_insert(0) += result.passenger_count as u64;
        }
    }

    buckets
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|((bucket, origin, destination), passenger_count)| AggregatedDemandEntry {
            scheme,
            bucket,
            origin_station_id: origin,
            destination_station_id: destination,
            passenger_count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::{Direction, ServiceType, TrainStatus, TripType};
    use utility::id::Id;

    fn timetable_entry(occupancy: u32) -> TimetableEntry {
        TimetableEntry {
            train_id: Id::new(1),
            service_type: ServiceType::Ab,
            station_id: Id::new(1),
            direction: Direction::Southbound,
            arrival_time: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(5, 0, 0).unwrap(),
            departure_time: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(5, 0, 30).unwrap(),
            travel_time_seconds: 0,
            boarded: 10,
            alighted: 0,
            station_waiting_count: 0,
            train_occupancy: occupancy,
            train_status: TrainStatus::Active,
        }
    }

    #[test]
    fn summarise_counts_boarded_and_averages_load() {
        let timetable = vec![timetable_entry(10), timetable_entry(20)];
        let metrics = summarise(Scheme::Regular, &timetable, &[], 100, 5);
        assert_eq!(metrics.total_boarded, 20);
        assert_eq!(metrics.average_load_factor, 0.15);
    }

    #[test]
    fn aggregate_demand_counts_am_peak_and_full_service() {
        let result = DemandResult {
            scheme: Scheme::Regular,
            arrival_time_at_origin: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(7, 30, 0).unwrap(),
            departure_from_origin: None,
            origin_station_id: Id::new(1),
            destination_station_id: Id::new(3),
            trip_type: TripType::Direct,
            passenger_count: 10,
            wait_time_seconds: None,
            travel_time_seconds: None,
        };
        let entries = aggregate_demand(Scheme::Regular, &[result]);
        let am_peak = entries.iter().find(|e| e.bucket == DemandBucket::AmPeak).unwrap();
        let full_service = entries.iter().find(|e| e.bucket == DemandBucket::FullService).unwrap();
        assert_eq!(am_peak.passenger_count, 10);
        assert_eq!(full_service.passenger_count, 10);
    }

    #[test]
    fn off_peak_result_counts_once_into_full_service_only() {
        let result = DemandResult {
            scheme: Scheme::Regular,
            arrival_time_at_origin: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(11, 0, 0).unwrap(),
            departure_from_origin: None,
            origin_station_id: Id::new(1),
            destination_station_id: Id::new(3),
            trip_type: TripType::Direct,
            passenger_count: 7,
            wait_time_seconds: None,
            travel_time_seconds: None,
        };
        let entries = aggregate_demand(Scheme::Regular, &[result]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].bucket, DemandBucket::FullService);
        assert_eq!(entries[0].passenger_count, 7);
    }
}
