use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::NaiveDateTime;
use model::{Event, EventKind, SegmentId, ServicePeriod, StationId, TrainId};

/// The min-priority queue of §4.1. Wraps events in `Reverse` so a
/// `BinaryHeap`, which is a max-heap by default, pops the earliest event
/// first; `Event`'s `Ord` impl already orders by `(time, kind, sequence)`.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Event>>,
    next_sequence: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_sequence: 0,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn schedule(
        &mut self,
        time: NaiveDateTime,
        kind: EventKind,
        train: Option<TrainId>,
        station: Option<StationId>,
        segment: Option<SegmentId>,
        period: Option<ServicePeriod>,
    ) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue
            .push(Reverse(Event::new(time, kind, train, station, segment, period, sequence)));
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        self.queue.pop().map(|Reverse(event)| event)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Iterates pending events in no particular order; used by the resource
    /// arbiter to look up e.g. "is there already a `segment_exit` event for
    /// this segment" (§4.3).
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.queue.iter().map(|Reverse(event)| event)
    }

    /// The earliest pending time for an event matching `kind` and `segment`,
    /// if any (§4.3 conflict resolution looks up a specific `segment_exit`).
    pub fn earliest_for_segment(&self, kind: EventKind, segment: SegmentId) -> Option<NaiveDateTime> {
        self.iter()
            .filter(|event| event.kind == kind && event.segment == Some(segment))
            .map(|event| event.time)
            .min()
    }

    /// The earliest pending time for an event matching `kind` and `train`
    /// (§4.3 looks up the occupant's own `train_departure`).
    pub fn earliest_for_train(&self, kind: EventKind, train: TrainId) -> Option<NaiveDateTime> {
        self.iter()
            .filter(|event| event.kind == kind && event.train == Some(train))
            .map(|event| event.time)
            .min()
    }

    /// Whether a `train_departure` is already scheduled at `time` for
    /// `station` by a train other than `train` (§4.3 "advance by 3 seconds"
    /// clause).
    pub fn has_conflicting_departure(&self, time: NaiveDateTime, station: StationId, train: TrainId) -> bool {
        self.iter().any(|event| {
            event.kind == EventKind::TrainDeparture
                && event.time == time
                && event.station == Some(station)
                && event.train != Some(train)
        })
    }

    /// Whether a `segment_enter` already exists for `segment` at `time`
    /// (§4.3 invariant 2, depot-insertion gating).
    pub fn has_segment_enter_at(&self, time: NaiveDateTime, segment: SegmentId) -> bool {
        self.iter()
            .any(|event| event.kind == EventKind::SegmentEnter && event.time == time && event.segment == Some(segment))
    }
}
