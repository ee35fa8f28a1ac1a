//! Arrival units and servers.
//!
//! A unit is an owned record: it lives in the wait-line, then in exactly one
//! server's slot, then in the engine's served list. Nothing else holds it.

use serde::Serialize;

/// Sequential unit identifier, starting at 1 within a run.
pub type UnitId = u64;

/// Server identifier, `1..=servers`.
pub type ServerId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitState {
    Waiting,
    InService,
    Departed,
}

/// One unit of work (a patient) and its timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArrivalUnit {
    id: UnitId,
    arrival_time: f64,
    service_start: Option<f64>,
    departure_time: Option<f64>,
}

impl ArrivalUnit {
    pub fn new(id: UnitId, arrival_time: f64) -> Self {
        Self {
            id,
            arrival_time,
            service_start: None,
            departure_time: None,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn arrival_time(&self) -> f64 {
        self.arrival_time
    }

    /// Simulation time when a server picked the unit up.
    pub fn service_start(&self) -> Option<f64> {
        self.service_start
    }

    /// Simulation time when service completed.
    pub fn departure_time(&self) -> Option<f64> {
        self.departure_time
    }

    pub(crate) fn start_service(&mut self, now: f64) {
        debug_assert!(self.service_start.is_none(), "service already started");
        debug_assert!(now >= self.arrival_time, "service cannot precede arrival");
        self.service_start = Some(now);
    }

    pub(crate) fn depart(&mut self, now: f64) {
        debug_assert!(self.service_start.is_some(), "departure before service");
        self.departure_time = Some(now);
    }

    /// Time from arrival to service start; 0 while still waiting.
    pub fn waiting_time(&self) -> f64 {
        self.service_start
            .map_or(0.0, |start| start - self.arrival_time)
    }

    /// Time from service start to departure; 0 until both are known.
    pub fn service_time(&self) -> f64 {
        match (self.service_start, self.departure_time) {
            (Some(start), Some(end)) => end - start,
            _ => 0.0,
        }
    }

    pub fn has_completed_service(&self) -> bool {
        self.departure_time.is_some()
    }

    pub fn state(&self) -> UnitState {
        match (self.service_start, self.departure_time) {
            (None, _) => UnitState::Waiting,
            (Some(_), None) => UnitState::InService,
            (Some(_), Some(_)) => UnitState::Departed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServerState {
    Idle,
    Busy,
}

/// One interchangeable service point (a doctor).
///
/// Availability is not stored separately: a server is busy exactly when it
/// holds a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Server {
    id: ServerId,
    current: Option<ArrivalUnit>,
    busy_time: f64,
    units_served: u64,
}

impl Server {
    pub fn new(id: ServerId) -> Self {
        Self {
            id,
            current: None,
            busy_time: 0.0,
            units_served: 0,
        }
    }

    pub fn id(&self) -> ServerId {
        self.id
    }

    pub fn is_available(&self) -> bool {
        self.current.is_none()
    }

    pub fn state(&self) -> ServerState {
        if self.is_available() {
            ServerState::Idle
        } else {
            ServerState::Busy
        }
    }

    pub fn current_unit(&self) -> Option<&ArrivalUnit> {
        self.current.as_ref()
    }

    /// Accumulated busy time inside the observation horizon.
    pub fn busy_time(&self) -> f64 {
        self.busy_time
    }

    /// Units whose service this server completed.
    pub fn units_served(&self) -> u64 {
        self.units_served
    }

    /// Busy fraction of a window of length `window`; 0 for an empty window.
    pub fn utilization(&self, window: f64) -> f64 {
        if window > 0.0 {
            self.busy_time / window
        } else {
            0.0
        }
    }

    pub(crate) fn assign(&mut self, unit: ArrivalUnit) {
        debug_assert!(self.is_available(), "server {} is already busy", self.id);
        self.current = Some(unit);
    }

    /// Takes the unit out of service, crediting busy time from its service
    /// start up to `credit_until`.
    pub(crate) fn release(&mut self, credit_until: f64) -> Option<ArrivalUnit> {
        let unit = self.current.take()?;
        if let Some(start) = unit.service_start() {
            self.add_busy_time(credit_until - start);
        }
        self.units_served += 1;
        Some(unit)
    }

    /// Credits the in-flight unit up to `until` without releasing it.
    /// Services starting at or after `until` earn nothing.
    pub(crate) fn credit_in_flight(&mut self, until: f64) {
        let start = self.current.and_then(|unit| unit.service_start());
        if let Some(start) = start {
            if start < until {
                self.add_busy_time(until - start);
            }
        }
    }

    fn add_busy_time(&mut self, duration: f64) {
        if duration > 0.0 {
            self.busy_time += duration;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_timeline_derives_wait_and_service() {
        let mut unit = ArrivalUnit::new(1, 2.0);
        assert_eq!(unit.state(), UnitState::Waiting);
        assert_eq!(unit.waiting_time(), 0.0);
        assert_eq!(unit.service_time(), 0.0);

        unit.start_service(3.5);
        assert_eq!(unit.state(), UnitState::InService);
        assert_eq!(unit.waiting_time(), 1.5);
        assert_eq!(unit.service_time(), 0.0);

        unit.depart(6.0);
        assert_eq!(unit.state(), UnitState::Departed);
        assert_eq!(unit.service_time(), 2.5);
        assert!(unit.has_completed_service());
    }

    #[test]
    fn server_availability_tracks_assignment() {
        let mut server = Server::new(1);
        assert!(server.is_available());

        let mut unit = ArrivalUnit::new(7, 1.0);
        unit.start_service(1.0);
        server.assign(unit);
        assert_eq!(server.state(), ServerState::Busy);
        assert_eq!(server.current_unit().map(ArrivalUnit::id), Some(7));

        let released = server.release(4.0).expect("unit in service");
        assert_eq!(released.id(), 7);
        assert!(server.is_available());
        assert_eq!(server.busy_time(), 3.0);
        assert_eq!(server.units_served(), 1);
        assert!(server.release(5.0).is_none());
    }

    #[test]
    fn in_flight_credit_stops_at_horizon() {
        let mut server = Server::new(1);
        let mut unit = ArrivalUnit::new(1, 6.0);
        unit.start_service(6.0);
        server.assign(unit);

        server.credit_in_flight(10.0);
        assert_eq!(server.busy_time(), 4.0);
        assert_eq!(server.utilization(10.0), 0.4);
    }

    #[test]
    fn service_starting_at_horizon_earns_nothing() {
        let mut server = Server::new(2);
        let mut unit = ArrivalUnit::new(3, 10.0);
        unit.start_service(10.0);
        server.assign(unit);

        server.credit_in_flight(10.0);
        assert_eq!(server.busy_time(), 0.0);

        // A departure past the horizon is capped there as well.
        server.release(10.0);
        assert_eq!(server.busy_time(), 0.0);
    }
}
