use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::entities::{ServerId, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    Arrival,
    Departure,
}

/// One processed event, as reported by [crate::engine::SimulationEngine::step].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SimEvent {
    /// `server` is the server that took the unit immediately, `None` if it queued.
    Arrival {
        time: f64,
        unit: UnitId,
        server: Option<ServerId>,
    },
    /// `next_unit` is the queued unit the freed server picked up, if any.
    Departure {
        time: f64,
        unit: UnitId,
        server: ServerId,
        next_unit: Option<UnitId>,
    },
}

impl SimEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SimEvent::Arrival { .. } => EventKind::Arrival,
            SimEvent::Departure { .. } => EventKind::Departure,
        }
    }

    pub fn time(&self) -> f64 {
        match *self {
            SimEvent::Arrival { time, .. } | SimEvent::Departure { time, .. } => time,
        }
    }

    pub fn unit(&self) -> UnitId {
        match *self {
            SimEvent::Arrival { unit, .. } | SimEvent::Departure { unit, .. } => unit,
        }
    }
}

/// A scheduled service completion.
#[derive(Debug, Clone, Copy)]
pub struct Departure {
    pub time: f64,
    pub server: ServerId,
    pub unit: UnitId,
    seq: u64,
}

impl Ord for Departure {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by time; equal times
        // pop in scheduling order.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Departure {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Departure {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Departure {}

/// Simulated time plus the pending departure set.
///
/// Arrivals are not queued here: there is only ever one pending arrival, and
/// the engine compares it against [SimulationClock::peek_departure].
#[derive(Debug, Default)]
pub struct SimulationClock {
    now: f64,
    departures: BinaryHeap<Departure>,
    next_seq: u64,
}

impl SimulationClock {
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Moves simulated time forward to `time`.
    pub fn advance_to(&mut self, time: f64) {
        debug_assert!(time >= self.now, "time must not run backwards");
        self.now = time;
    }

    pub fn schedule_departure(&mut self, time: f64, server: ServerId, unit: UnitId) {
        debug_assert!(time >= self.now, "departure must not be in the past");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.departures.push(Departure {
            time,
            server,
            unit,
            seq,
        });
    }

    /// Earliest pending departure without removing it.
    pub fn peek_departure(&self) -> Option<&Departure> {
        self.departures.peek()
    }

    /// Removes the earliest pending departure and advances time to it.
    pub fn pop_departure(&mut self) -> Option<Departure> {
        let departure = self.departures.pop()?;
        self.advance_to(departure.time);
        Some(departure)
    }

    /// Time at which `server` is scheduled to finish its current unit.
    pub fn scheduled_departure(&self, server: ServerId) -> Option<f64> {
        self.departures
            .iter()
            .filter(|departure| departure.server == server)
            .map(|departure| departure.time)
            .min_by(f64::total_cmp)
    }

    pub fn pending_departures(&self) -> usize {
        self.departures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.departures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pops_departures_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_departure(10.0, 1, 1);
        clock.schedule_departure(5.5, 2, 2);
        clock.schedule_departure(20.0, 3, 3);

        let first = clock.pop_departure().expect("first departure");
        assert_eq!(first.time, 5.5);
        assert_eq!(clock.now(), 5.5);

        let second = clock.pop_departure().expect("second departure");
        assert_eq!(second.unit, 1);
        assert_eq!(clock.now(), 10.0);

        let third = clock.pop_departure().expect("third departure");
        assert_eq!(third.server, 3);
        assert_eq!(clock.now(), 20.0);

        assert!(clock.pop_departure().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn equal_times_pop_in_scheduling_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_departure(4.0, 2, 11);
        clock.schedule_departure(4.0, 1, 12);
        clock.schedule_departure(4.0, 3, 13);

        let order: Vec<_> = std::iter::from_fn(|| clock.pop_departure())
            .map(|d| d.unit)
            .collect();
        assert_eq!(order, vec![11, 12, 13]);
    }

    #[test]
    fn peek_does_not_advance_time() {
        let mut clock = SimulationClock::default();
        clock.advance_to(1.0);
        clock.schedule_departure(3.0, 1, 1);
        assert_eq!(clock.peek_departure().map(|d| d.time), Some(3.0));
        assert_eq!(clock.now(), 1.0);
        assert_eq!(clock.pending_departures(), 1);
    }

    #[test]
    fn scheduled_departure_per_server() {
        let mut clock = SimulationClock::default();
        clock.schedule_departure(7.0, 2, 1);
        clock.schedule_departure(3.0, 1, 2);
        assert_eq!(clock.scheduled_departure(1), Some(3.0));
        assert_eq!(clock.scheduled_departure(2), Some(7.0));
        assert_eq!(clock.scheduled_departure(3), None);
    }

    #[test]
    fn event_accessors() {
        let event = SimEvent::Departure {
            time: 2.0,
            unit: 4,
            server: 1,
            next_unit: Some(5),
        };
        assert_eq!(event.kind(), EventKind::Departure);
        assert_eq!(event.time(), 2.0);
        assert_eq!(event.unit(), 4);
    }
}
