//! Topology Builder (§4.2) and the loop-time calculation (§4.4.2).

use std::sync::Arc;

use config::Configuration;
use indexmap::IndexMap;
use model::{
    Direction, Scheme, SegmentId, ServiceType, Station, StationId, TrackSegment, Train, TrainId, TrainSpec,
};
use utility::rounding::round_half_to_even;

use crate::error::TopologyError;
use crate::motion;

/// The read-only line topology for one scheme (§4.2): the station list,
/// the directional segment graph, and the train roster. Populated once per
/// scheme and never mutated except through the train/station/segment state
/// held inside it during a run.
pub struct Topology {
    pub stations: Vec<Station>,
    pub segments: IndexMap<SegmentId, TrackSegment>,
    pub trains: Vec<Train>,
    pub spec: Arc<TrainSpec>,
}

impl Topology {
    pub fn station(&self, id: StationId) -> &Station {
        &self.stations[id.raw() as usize - 1]
    }

    pub fn station_mut(&mut self, id: StationId) -> &mut Station {
        &mut self.stations[id.raw() as usize - 1]
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn train(&self, id: TrainId) -> &Train {
        &self.trains[id.raw() as usize - 1]
    }

    pub fn train_mut(&mut self, id: TrainId) -> &mut Train {
        &mut self.trains[id.raw() as usize - 1]
    }

    pub fn segment(&self, id: SegmentId) -> Option<&TrackSegment> {
        self.segments.get(&id)
    }

    pub fn segment_mut(&mut self, id: SegmentId) -> Option<&mut TrackSegment> {
        self.segments.get_mut(&id)
    }

    /// A read-only, index-aligned snapshot of station types, for passing to
    /// code that also needs a mutable borrow of a specific station/train out
    /// of the same arenas (§9 "indexed arena" — disjoint fields, not a single
    /// aliasable object).
    pub fn station_types(&self) -> Vec<ServiceType> {
        self.stations.iter().map(|station| station.station_type).collect()
    }

    /// Splits a mutable borrow of one station and one train out of their
    /// separate arenas so both can be mutated in the same call (train state
    /// machine handlers need this for every arrival/departure/turnaround).
    pub fn station_and_train_mut(&mut self, station_id: StationId, train_id: TrainId) -> (&mut Station, &mut Train) {
        let station = &mut self.stations[station_id.raw() as usize - 1];
        let train = &mut self.trains[train_id.raw() as usize - 1];
        (station, train)
    }
}

/// Builds the topology for `scheme`. `scheme` is independent of
/// `config.scheme_type`: the same configuration can build both a REGULAR
/// and a SKIP-STOP topology (§4.2), the way the `runner` evaluates both
/// schemes from one configuration/demand pair.
pub fn build(config: &Configuration, scheme: Scheme) -> Topology {
    let station_count = config.station_names.len();

    let stations = (0..station_count)
        .map(|index| {
            let id = StationId::new((index + 1) as u32);
            let station_type = match scheme {
                Scheme::Regular => ServiceType::Ab,
                Scheme::SkipStop => config
                    .scheme_pattern
                    .as_ref()
                    .expect("validated: schemePattern present for SKIP-STOP")[index],
            };
            let is_terminus = index == 0 || index == station_count - 1;
            Station::new(id, config.station_names[index].clone(), station_type, is_terminus)
        })
        .collect::<Vec<_>>();

    let mut segments = IndexMap::new();
    for index in 0..station_count - 1 {
        let from = StationId::new((index + 1) as u32);
        let to = StationId::new((index + 2) as u32);
        let distance_m = config.station_distances[index] * 1000.0;
        segments.insert(
            SegmentId::new(from, to),
            TrackSegment::new(SegmentId::new(from, to), Direction::Southbound, distance_m),
        );
        segments.insert(
            SegmentId::new(to, from),
            TrackSegment::new(SegmentId::new(to, from), Direction::Northbound, distance_m),
        );
    }

    let mut stations = stations;
    for index in 0..station_count {
        let id = StationId::new((index + 1) as u32);
        if index < station_count - 1 {
            stations[index].tracks.southbound = Some(SegmentId::new(id, StationId::new((index + 2) as u32)));
        }
        if index > 0 {
            stations[index].tracks.northbound = Some(SegmentId::new(id, StationId::new(index as u32)));
        }
    }

    let spec = Arc::new(TrainSpec {
        capacity: config.max_capacity,
        cruising_speed_mps: config.cruising_speed_mps(),
        passthrough_speed_mps: config.passthrough_speed_mps(),
        acceleration_mps2: config.acceleration,
        deceleration_mps2: config.deceleration,
    });

    let max_train_count = config
        .service_periods
        .iter()
        .map(|period| period.train_count(scheme))
        .max()
        .unwrap_or(0);

    let trains = (0..max_train_count)
        .map(|index| {
            let id = TrainId::new(index + 1);
            let service_type = match scheme {
                Scheme::Regular => ServiceType::Ab,
                Scheme::SkipStop => {
                    if (index + 1) % 2 == 1 {
                        ServiceType::A
                    } else {
                        ServiceType::B
                    }
                }
            };
            let mut train = Train::new(id, spec.clone(), service_type);
            train.current_station = Some(StationId::new(1));
            train.direction = Direction::Southbound;
            train.is_active = false;
            train
        })
        .collect();

    Topology {
        stations,
        segments,
        trains,
        spec,
    }
}

/// Walks a representative train from station 1 southbound to the far
/// terminus (accumulating traversal + dwell where it stops), adds one
/// turnaround, walks back north, and adds a final dwell (§4.4.2). Returns
/// the loop time in seconds.
pub fn loop_time_seconds(
    topology: &Topology,
    config: &Configuration,
    service_type: ServiceType,
) -> Result<i64, TopologyError> {
    let dwell = config.dwell_time as i64;
    let turnaround = config.turnaround_time as i64;
    let zone_length_m = config.zone_length;
    let stations = topology.station_count();

    let mut total = 0i64;
    let mut speed = 0.0f64;

    for leg in [Direction::Southbound, Direction::Northbound] {
        let order: Box<dyn Iterator<Item = usize>> = match leg {
            Direction::Southbound => Box::new(0..stations - 1),
            Direction::Northbound => Box::new((0..stations - 1).rev()),
        };
        for index in order {
            let (from, to) = match leg {
                Direction::Southbound => (index + 1, index + 2),
                Direction::Northbound => (index + 2, index + 1),
            };
            let from_id = StationId::new(from as u32);
            let to_id = StationId::new(to as u32);
            let segment_id = SegmentId::new(from_id, to_id);
            let segment = topology
                .segment(segment_id)
                .ok_or(TopologyError::MissingSegment { from: from_id, direction: leg })?;

            let stops_here = topology.station(to_id).should_stop(service_type);
            let traversal = motion::traverse(&topology.spec, speed, segment.distance_m, stops_here, zone_length_m);
            total += traversal.seconds;
            speed = traversal.exit_speed_mps;

            if stops_here {
                total += dwell;
                speed = 0.0;
            }
        }
        if leg == Direction::Southbound {
            total += turnaround;
        }
    }

    Ok(total)
}

/// `round_half_to_even(loop_time_minutes / train_count)`, the headway
/// formula of §3.
pub fn headway_minutes(loop_time_seconds: i64, train_count: u32) -> f64 {
    if train_count == 0 {
        return 0.0;
    }
    let loop_time_minutes = loop_time_seconds as f64 / 60.0;
    round_half_to_even(loop_time_minutes / train_count as f64) as f64
}
