use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::Serialize;

use crate::scheme::Direction;
use crate::station::StationId;
use crate::train::TrainId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    Direct,
    Transfer,
}

/// `status` progresses strictly left-to-right (§3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DemandStatus {
    WaitingAtOrigin,
    InTransitLeg1,
    WaitingForTransfer,
    InTransitLeg2,
    Completed,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct PassengerDemandGroup {
    pub origin_station_id: StationId,
    pub destination_station_id: StationId,
    pub arrival_time: NaiveDateTime,
    pub passenger_count: u32,
    pub trip_type: TripType,
    pub transfer_station_id: Option<StationId>,
    pub status: DemandStatus,
    pub direction: Option<Direction>,
    pub train_id: Option<TrainId>,

    #[serde(skip)]
    pub boarding_time: Option<NaiveDateTime>,
    #[serde(skip)]
    pub arrival_at_transfer_time: Option<NaiveDateTime>,
    #[serde(skip)]
    pub departure_from_origin_time: Option<NaiveDateTime>,
    #[serde(skip)]
    pub departure_from_transfer_time: Option<NaiveDateTime>,
    #[serde(skip)]
    pub completion_time: Option<NaiveDateTime>,

    /// Sum of origin wait and (if any) transfer wait, finalised incrementally
    /// as each leg is boarded (§4.6).
    accumulated_wait_time_s: i64,
}

impl PassengerDemandGroup {
    pub fn new(
        origin_station_id: StationId,
        destination_station_id: StationId,
        arrival_time: NaiveDateTime,
        passenger_count: u32,
        trip_type: TripType,
        transfer_station_id: Option<StationId>,
    ) -> Self {
        Self {
            origin_station_id,
            destination_station_id,
            arrival_time,
            passenger_count,
            trip_type,
            transfer_station_id,
            status: DemandStatus::WaitingAtOrigin,
            direction: None,
            train_id: None,
            boarding_time: None,
            arrival_at_transfer_time: None,
            departure_from_origin_time: None,
            departure_from_transfer_time: None,
            completion_time: None,
            accumulated_wait_time_s: 0,
        }
    }

    /// The station this group must reach on its *current* leg: the transfer
    /// station while on leg 1 of a transfer trip, otherwise the destination
    /// (§4.6 boarding compatibility rule 4).
    pub fn next_required_stop(&self) -> StationId {
        match (self.trip_type, self.status) {
            (TripType::Transfer, DemandStatus::WaitingAtOrigin) => self
                .transfer_station_id
                .expect("transfer trip must have a transfer station"),
            _ => self.destination_station_id,
        }
    }

    pub fn board_leg1(&mut self, departure_time: NaiveDateTime) {
        self.boarding_time.get_or_insert(departure_time);
        self.departure_from_origin_time = Some(departure_time);
        self.accumulated_wait_time_s += (departure_time - self.arrival_time).num_seconds();
        self.status = match self.trip_type {
            TripType::Direct => DemandStatus::InTransitLeg1,
            TripType::Transfer => DemandStatus::InTransitLeg1,
        };
    }

    pub fn board_leg2(&mut self, departure_time: NaiveDateTime) {
        let transfer_arrival = self
            .arrival_at_transfer_time
            .expect("leg2 boarding requires a transfer arrival time");
        self.departure_from_transfer_time = Some(departure_time);
        self.accumulated_wait_time_s += (departure_time - transfer_arrival).num_seconds();
        self.status = DemandStatus::InTransitLeg2;
    }

    pub fn alight_at_transfer(&mut self, arrival_time: NaiveDateTime, leg2_direction: Direction) {
        self.arrival_at_transfer_time = Some(arrival_time);
        self.direction = Some(leg2_direction);
        self.status = DemandStatus::WaitingForTransfer;
    }

    pub fn complete(&mut self, arrival_time: NaiveDateTime) {
        self.completion_time = Some(arrival_time);
        self.status = DemandStatus::Completed;
    }

    pub fn wait_time_s(&self) -> Option<i64> {
        if self.boarding_time.is_some() {
            Some(self.accumulated_wait_time_s)
        } else {
            None
        }
    }

    pub fn travel_time_s(&self) -> Option<i64> {
        match (self.completion_time, self.boarding_time) {
            (Some(completion), Some(boarding)) => Some((completion - boarding).num_seconds()),
            _ => None,
        }
    }
}
