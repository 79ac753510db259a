//! Passenger Exchange (§4.6): alighting, boarding, and transfer-station
//! selection, grounded on `Station.process_passenger_exchange` and
//! `Passenger.find_nearest_transfer` in the original implementation.

use chrono::NaiveDateTime;
use model::{DemandStatus, Direction, PassengerDemandGroup, ServiceType, Station, StationId, Train, TripType};

/// Chooses the AB station minimising `|origin - candidate| + |candidate -
/// destination|`, breaking ties towards the candidate closer to the origin
/// (§4.6 "Transfer selection").
pub fn select_transfer_station<'a>(
    stations: impl Iterator<Item = &'a Station>,
    origin_raw: u32,
    destination_raw: u32,
) -> Option<&'a Station> {
    let mut best: Option<(&Station, u32, u32)> = None;
    for candidate in stations.filter(|station| station.station_type == ServiceType::Ab) {
        let candidate_raw = candidate.id.raw();
        let dist_origin = origin_raw.abs_diff(candidate_raw);
        let dist_destination = destination_raw.abs_diff(candidate_raw);
        let total = dist_origin + dist_destination;
        best = match best {
            None => Some((candidate, total, dist_origin)),
            Some((_, best_total, best_dist_origin)) if total < best_total => Some((candidate, total, dist_origin)),
            Some((best_station, best_total, best_dist_origin)) if total == best_total && dist_origin < best_dist_origin => {
                Some((candidate, total, dist_origin))
            }
            Some(existing) => Some(existing),
        };
    }
    best.map(|(station, _, _)| station)
}

/// Result of one exchange at a stop (§4.6). `completed` carries the groups
/// that reached `Completed` status in this call, for the per-passenger-group
/// output of §6; `alighted` is the passenger count across both completed and
/// transfer-waiting groups.
#[derive(Debug, Clone, Default)]
pub struct ExchangeOutcome {
    pub boarded: u32,
    pub alighted: u32,
    pub completed: Vec<PassengerDemandGroup>,
}

/// Alights completed/transferring groups and boards compatible waiting
/// groups up to capacity, in that order (§4.6). Only called when the
/// station is a stop for this train.
///
/// Takes `station_types` (indexed by `StationId::raw() - 1`) rather than a
/// `&Topology`: `station` and `train` are themselves borrowed out of a
/// topology's arenas, so a second immutable borrow of the whole topology
/// would alias them. The caller snapshots types once before splitting its
/// borrows.
pub fn exchange(
    station_types: &[ServiceType],
    station: &mut Station,
    train: &mut Train,
    arrival_time: NaiveDateTime,
    departure_time: NaiveDateTime,
) -> ExchangeOutcome {
    let (alighted, completed) = alight(station, train, arrival_time);
    let boarded = board(station_types, station, train, departure_time);
    ExchangeOutcome {
        boarded,
        alighted,
        completed,
    }
}

pub(crate) fn alight(station: &mut Station, train: &mut Train, arrival_time: NaiveDateTime) -> (u32, Vec<PassengerDemandGroup>) {
    let mut alighted = 0u32;
    let mut completed = Vec::new();
    let mut index = 0;
    while index < train.boarded.len() {
        let group = &mut train.boarded[index];
        let done = match (group.trip_type, group.status) {
            (TripType::Direct, DemandStatus::InTransitLeg1) if group.destination_station_id == station.id => {
                group.complete(arrival_time);
                true
            }
            (TripType::Transfer, DemandStatus::InTransitLeg1) if group.transfer_station_id == Some(station.id) => {
                let leg2_direction = direction_between(station.id, group.destination_station_id);
                group.alight_at_transfer(arrival_time, leg2_direction);
                true
            }
            (TripType::Transfer, DemandStatus::InTransitLeg2) if group.destination_station_id == station.id => {
                group.complete(arrival_time);
                true
            }
            _ => false,
        };

        if done {
            let group = train.boarded.remove(index);
            train.current_passenger_count = train.current_passenger_count.saturating_sub(group.passenger_count);
            alighted += group.passenger_count;
            if group.status == DemandStatus::WaitingForTransfer {
                station.waiting.push(group);
            } else {
                completed.push(group);
            }
        } else {
            index += 1;
        }
    }
    (alighted, completed)
}

/// Direction of travel from `from` to `to` along the line: southbound if the
/// target station has a larger index, northbound otherwise. Used both to
/// derive a transferring group's leg-2 direction (§4.6) and its initial
/// direction at seeding time.
pub fn direction_between(from: StationId, to: StationId) -> Direction {
    if to.raw() >= from.raw() {
        Direction::Southbound
    } else {
        Direction::Northbound
    }
}

fn board(station_types: &[ServiceType], station: &mut Station, train: &mut Train, departure_time: NaiveDateTime) -> u32 {
    let mut boarded = 0u32;
    let mut index = 0;
    while index < station.waiting.len() {
        if train.remaining_capacity() == 0 {
            break;
        }
        let eligible = is_eligible(station_types, &station.waiting[index], station, train, departure_time);
        if eligible && station.waiting[index].passenger_count <= train.remaining_capacity() {
            let mut group = station.waiting.remove(index);
            match group.status {
                DemandStatus::WaitingAtOrigin => group.board_leg1(departure_time),
                DemandStatus::WaitingForTransfer => group.board_leg2(departure_time),
                _ => unreachable!("only waiting statuses are ever queued at a station"),
            }
            boarded += group.passenger_count;
            train.board(group);
        } else {
            index += 1;
        }
    }
    boarded
}

fn is_eligible(station_types: &[ServiceType], group: &PassengerDemandGroup, station: &Station, train: &Train, departure_time: NaiveDateTime) -> bool {
    if !station.should_stop(train.service_type) {
        return false;
    }
    let arrived = match group.status {
        DemandStatus::WaitingAtOrigin => group.arrival_time <= departure_time,
        DemandStatus::WaitingForTransfer => group
            .arrival_at_transfer_time
            .map(|arrival| arrival <= departure_time)
            .unwrap_or(false),
        _ => false,
    };
    if !arrived {
        return false;
    }
    let Some(direction) = group.direction else {
        return false;
    };
    if direction != train.direction {
        return false;
    }
    let next_stop: StationId = group.next_required_stop();
    let next_stop_type = station_types[next_stop.raw() as usize - 1];
    train.service_type.stops_at(next_stop_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::StationId;

    fn station(id: u32, station_type: ServiceType) -> Station {
        Station::new(StationId::new(id), format!("S{id}"), station_type, false)
    }

    #[test]
    fn selects_closest_ab_station_with_origin_tiebreak() {
        let stations = vec![
            station(1, ServiceType::Ab),
            station(2, ServiceType::A),
            station(3, ServiceType::Ab),
            station(4, ServiceType::B),
            station(5, ServiceType::Ab),
        ];
        let chosen = select_transfer_station(stations.iter(), 2, 4).unwrap();
        assert_eq!(chosen.id.raw(), 3);
    }

    #[test]
    fn no_ab_stations_returns_none() {
        let stations = vec![station(1, ServiceType::A), station(2, ServiceType::B)];
        assert!(select_transfer_station(stations.iter(), 1, 2).is_none());
    }
}
