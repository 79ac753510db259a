//! Builds the initial `PassengerDemandGroup` population from raw demand
//! records (§4.6 "Transfer selection", §9 supplement 4). Grounded on
//! `Passenger_Demand` construction and `find_nearest_transfer` in the
//! original implementation, which reads an explicit `TRIP_TYPE` column; this
//! spec has no such input column (§6), so trip type is derived instead from
//! invariant 7 of §8: direct iff origin and destination share a station type
//! or either is AB.

use demand::RawDemandRecord;
use model::{PassengerDemandGroup, Scheme, ServiceType, StationId, TripType};

use crate::passenger_exchange::{direction_between, select_transfer_station};
use crate::topology::Topology;

/// Converts one non-zero demand cell into a waiting `PassengerDemandGroup`,
/// classifying its trip type and (for transfers) its transfer station and
/// initial direction (§8 invariant 7, §4.6 transfer selection).
pub fn seed(topology: &Topology, scheme: Scheme, records: Vec<RawDemandRecord>) -> Vec<PassengerDemandGroup> {
    records
        .into_iter()
        .filter_map(|record| build_group(topology, scheme, record))
        .collect()
}

fn build_group(topology: &Topology, scheme: Scheme, record: RawDemandRecord) -> Option<PassengerDemandGroup> {
    if record.origin_station_id as usize > topology.station_count() || record.destination_station_id as usize > topology.station_count() {
        log::warn!(
            "skipping demand record with out-of-range station id: {}->{}",
            record.origin_station_id,
            record.destination_station_id
        );
        return None;
    }

    let origin = StationId::new(record.origin_station_id);
    let destination = StationId::new(record.destination_station_id);
    let origin_type = topology.station(origin).station_type;
    let destination_type = topology.station(destination).station_type;

    let trip_type = classify_trip(scheme, origin_type, destination_type);
    let transfer_station_id = if trip_type == TripType::Transfer {
        match select_transfer_station(topology.stations.iter(), origin.raw(), destination.raw()) {
            Some(station) => Some(station.id),
            None => {
                log::warn!(
                    "no AB station available to transfer {}->{}; treating as direct",
                    origin.raw(),
                    destination.raw()
                );
                None
            }
        }
    } else {
        None
    };
    let trip_type = if trip_type == TripType::Transfer && transfer_station_id.is_none() {
        TripType::Direct
    } else {
        trip_type
    };

    let mut group = PassengerDemandGroup::new(
        origin,
        destination,
        record.timestamp,
        record.passenger_count,
        trip_type,
        transfer_station_id,
    );
    let next_stop = group.next_required_stop();
    group.direction = Some(direction_between(origin, next_stop));
    Some(group)
}

/// Direct iff origin and destination share a station type or either is AB
/// (§8 invariant 7); under REGULAR every station is AB so this is always
/// direct (§8 invariant 6).
pub fn classify_trip(scheme: Scheme, origin_type: ServiceType, destination_type: ServiceType) -> TripType {
    match scheme {
        Scheme::Regular => TripType::Direct,
        Scheme::SkipStop => {
            if origin_type == destination_type || origin_type == ServiceType::Ab || destination_type == ServiceType::Ab {
                TripType::Direct
            } else {
                TripType::Transfer
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use config::Configuration;
    use model::ServiceType as St;

    fn config_with_pattern(pattern: &[&str]) -> Configuration {
        let pattern_json = pattern.iter().map(|p| format!("\"{p}\"")).collect::<Vec<_>>().join(",");
        let json = format!(
            r#"{{
                "dwellTime": 30, "turnaroundTime": 60, "acceleration": 1.0, "deceleration": 1.0,
                "maxSpeed": 60.0, "maxCapacity": 100, "schemeType": "SKIP-STOP",
                "stationNames": {names:?},
                "stationDistances": {distances:?},
                "schemePattern": [{pattern_json}],
                "servicePeriods": []
            }}"#,
            names = (1..=pattern.len()).map(|i| format!("S{i}")).collect::<Vec<_>>(),
            distances = vec![1.0; pattern.len() - 1],
            pattern_json = pattern_json,
        );
        Configuration::from_json(&json).unwrap()
    }

    fn timestamp() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(5, 0, 0).unwrap()
    }

    #[test]
    fn mismatched_types_become_transfer_via_nearest_ab() {
        let config = config_with_pattern(&["AB", "A", "AB", "B", "AB"]);
        let topology = crate::topology::build(&config, Scheme::SkipStop);
        let record = RawDemandRecord {
            timestamp: timestamp(),
            origin_station_id: 2,
            destination_station_id: 4,
            passenger_count: 5,
        };
        let groups = seed(&topology, Scheme::SkipStop, vec![record]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].trip_type, TripType::Transfer);
        assert_eq!(groups[0].transfer_station_id.unwrap().raw(), 3);
    }

    #[test]
    fn shared_type_is_direct() {
        let config = config_with_pattern(&["AB", "A", "AB", "A", "AB"]);
        let topology = crate::topology::build(&config, Scheme::SkipStop);
        let record = RawDemandRecord {
            timestamp: timestamp(),
            origin_station_id: 2,
            destination_station_id: 4,
            passenger_count: 5,
        };
        let groups = seed(&topology, Scheme::SkipStop, vec![record]);
        assert_eq!(groups[0].trip_type, TripType::Direct);
        assert!(groups[0].transfer_station_id.is_none());
    }

    #[test]
    fn out_of_range_station_is_skipped() {
        let config = config_with_pattern(&["AB", "A", "AB"]);
        let topology = crate::topology::build(&config, Scheme::SkipStop);
        let record = RawDemandRecord {
            timestamp: timestamp(),
            origin_station_id: 1,
            destination_station_id: 9,
            passenger_count: 5,
        };
        assert!(seed(&topology, Scheme::SkipStop, vec![record]).is_empty());
    }

    #[test]
    fn classify_trip_regular_is_always_direct() {
        assert_eq!(classify_trip(Scheme::Regular, St::A, St::B), TripType::Direct);
    }
}
