//! Simulation engine: next-event time advance over arrivals and departures.
//!
//! Each step compares the single pending arrival with the earliest pending
//! departure and processes one of them:
//!
//! 1. a departure, if one is pending and either the horizon has been reached
//!    or it is due no later than the next arrival (departures win ties);
//! 2. otherwise the next arrival, if time is still inside the horizon and the
//!    arrival is due at or before it;
//! 3. otherwise any remaining departure, draining work past the horizon;
//! 4. otherwise the run is over.
//!
//! No arrival is admitted once the horizon is reached, and queued units only
//! start service on departures that happen strictly inside the horizon.
//! [SimulationEngine::finish] then extends the wait-line integral to the end
//! of the observed window and credits servers still busy, and compiles the
//! report. The window is the horizon, or the time reached when the run is
//! finished with events still pending before it (event cap, early `finish`).

use tracing::{debug, info, trace, warn};

use crate::clock::{Departure, SimEvent, SimulationClock};
use crate::config::SimulationConfig;
use crate::entities::{ArrivalUnit, Server, ServerId, UnitId};
use crate::error::SimResult;
use crate::profiling::EventMetrics;
use crate::report::{mean, ServerReport, SimulationReport};
use crate::variates::{Rate, VariateSource};
use crate::wait_line::WaitLine;

pub struct SimulationEngine<V> {
    config: SimulationConfig,
    horizon: f64,
    arrival_rate: Rate,
    service_rate: Rate,
    variates: V,
    clock: SimulationClock,
    servers: Vec<Server>,
    wait_line: WaitLine,
    served: Vec<ArrivalUnit>,
    next_arrival: Option<f64>,
    last_unit_id: UnitId,
    total_arrived: u64,
    metrics: EventMetrics,
    truncated: bool,
    finalized: bool,
    observed_until: f64,
}

impl<V: VariateSource> SimulationEngine<V> {
    /// Validates `config` and builds the server pool. Nothing is allocated
    /// when validation fails.
    pub fn new(config: SimulationConfig, mut variates: V) -> SimResult<Self> {
        let params = config.validated()?;
        let servers = (1..=params.servers).map(Server::new).collect();
        let first_arrival = variates.sample_exponential(params.arrival_rate);

        Ok(Self {
            horizon: params.horizon,
            arrival_rate: params.arrival_rate,
            service_rate: params.service_rate,
            config,
            variates,
            clock: SimulationClock::default(),
            servers,
            wait_line: WaitLine::new(),
            served: Vec::new(),
            next_arrival: Some(first_arrival),
            last_unit_id: 0,
            total_arrived: 0,
            metrics: EventMetrics::new(),
            truncated: false,
            finalized: false,
            observed_until: params.horizon,
        })
    }

    /// Runs to completion and returns the report.
    pub fn run(&mut self) -> SimulationReport {
        self.run_with_hook(|_, _| {})
    }

    /// Runs to completion, invoking `hook` after every processed event.
    pub fn run_with_hook<F>(&mut self, mut hook: F) -> SimulationReport
    where
        F: FnMut(&Self, &SimEvent),
    {
        info!(
            horizon = self.horizon,
            arrival_rate = self.arrival_rate.get(),
            service_rate = self.service_rate.get(),
            servers = self.servers.len(),
            "starting queue simulation"
        );
        while let Some(event) = self.step() {
            hook(self, &event);
        }
        let report = self.finish();
        info!(
            arrived = report.total_arrived,
            served = report.total_served,
            average_wait = report.average_wait,
            average_queue_length = report.average_queue_length,
            utilization = report.utilization,
            events = report.events_processed,
            "queue simulation finished"
        );
        report
    }

    /// Processes the next event, or returns `None` once no event is left (or
    /// the event cap has been hit, or the run was already finished).
    pub fn step(&mut self) -> Option<SimEvent> {
        if self.finalized {
            return None;
        }
        if let Some(limit) = self.config.max_events {
            if self.metrics.events_processed() >= limit {
                if !self.truncated {
                    warn!(limit, now = self.clock.now(), "event cap reached; stopping run");
                }
                self.truncated = true;
                return None;
            }
        }

        let now = self.clock.now();
        let next_departure = self.clock.peek_departure().map(|d| d.time);
        let departure_due = next_departure.is_some_and(|time| {
            now >= self.horizon || self.next_arrival.map_or(true, |arrival| time <= arrival)
        });

        let event = if departure_due {
            let departure = self.clock.pop_departure()?;
            self.process_departure(departure)
        } else if let Some(arrival) = self
            .next_arrival
            .filter(|&arrival| now < self.horizon && arrival <= self.horizon)
        {
            self.process_arrival(arrival)
        } else {
            let departure = self.clock.pop_departure()?;
            self.process_departure(departure)
        };

        self.metrics.record_event(event.kind());
        trace!(?event, now = self.clock.now(), queue = self.wait_line.len(), "processed event");
        Some(event)
    }

    fn process_arrival(&mut self, time: f64) -> SimEvent {
        self.clock.advance_to(time);
        self.last_unit_id += 1;
        let unit = ArrivalUnit::new(self.last_unit_id, time);
        self.total_arrived += 1;

        let server = match self.servers.iter().position(Server::is_available) {
            Some(index) => {
                self.start_service(index, unit);
                Some(self.servers[index].id())
            }
            None => {
                self.wait_line.enqueue(unit, time);
                None
            }
        };

        self.next_arrival = if time < self.horizon {
            Some(time + self.variates.sample_exponential(self.arrival_rate))
        } else {
            None
        };

        SimEvent::Arrival {
            time,
            unit: unit.id(),
            server,
        }
    }

    fn process_departure(&mut self, departure: Departure) -> SimEvent {
        let now = departure.time;
        let index = departure.server - 1;

        if let Some(mut unit) = self.servers[index].release(now.min(self.horizon)) {
            debug_assert_eq!(unit.id(), departure.unit);
            unit.depart(now);
            self.served.push(unit);
        }

        let mut next_unit = None;
        if !self.wait_line.is_empty() && now < self.horizon {
            if let Some(unit) = self.wait_line.dequeue(now) {
                next_unit = Some(unit.id());
                self.start_service(index, unit);
            }
        }

        SimEvent::Departure {
            time: now,
            unit: departure.unit,
            server: departure.server,
            next_unit,
        }
    }

    fn start_service(&mut self, index: usize, mut unit: ArrivalUnit) {
        let now = self.clock.now();
        unit.start_service(now);
        let duration = self.variates.sample_exponential(self.service_rate);
        let server = &mut self.servers[index];
        self.clock.schedule_departure(now + duration, server.id(), unit.id());
        server.assign(unit);
    }

    /// Finalizes time-weighted accumulators and compiles the report.
    ///
    /// Finalization happens on the first call only; later calls (and further
    /// [SimulationEngine::step] calls) leave the run untouched.
    pub fn finish(&mut self) -> SimulationReport {
        if !self.finalized {
            let cutoff = self.observation_end();
            self.observed_until = cutoff;
            self.wait_line.finalize(cutoff);
            for server in &mut self.servers {
                let until = self
                    .clock
                    .scheduled_departure(server.id())
                    .map_or(cutoff, |departure| departure.min(cutoff));
                server.credit_in_flight(until);
            }
            self.metrics.finish();
            self.finalized = true;
            debug!(
                now = self.clock.now(),
                observed_until = cutoff,
                in_service = self.in_service_units().count(),
                waiting = self.wait_line.len(),
                "finalized run accumulators"
            );
        }
        self.report()
    }

    /// End of the observed window: the horizon once nothing is left to
    /// happen inside it, otherwise the time the run got to.
    fn observation_end(&self) -> f64 {
        let pending = self.clock.pending_departures() > 0
            || self.next_arrival.is_some_and(|arrival| arrival <= self.horizon);
        if pending {
            self.clock.now().min(self.horizon)
        } else {
            self.horizon
        }
    }

    fn report(&self) -> SimulationReport {
        let window = self.observed_until;
        let per_server: Vec<ServerReport> = self
            .servers
            .iter()
            .map(|server| ServerReport {
                id: server.id(),
                busy_time: server.busy_time(),
                utilization: server.utilization(window),
                units_served: server.units_served(),
            })
            .collect();
        let total_busy: f64 = per_server.iter().map(|s| s.busy_time).sum();

        let capacity = window * self.servers.len() as f64;

        SimulationReport {
            horizon: self.horizon,
            observed_time: window,
            arrival_rate: self.arrival_rate.get(),
            service_rate: self.service_rate.get(),
            servers: self.servers.len(),
            total_arrived: self.total_arrived,
            total_served: self.served.len(),
            in_service_at_end: self.in_service_units().count(),
            waiting_at_end: self.wait_line.len(),
            average_wait: mean(self.served.iter().map(ArrivalUnit::waiting_time)),
            max_wait: self
                .served
                .iter()
                .map(ArrivalUnit::waiting_time)
                .fold(0.0, f64::max),
            average_service_time: mean(self.served.iter().map(ArrivalUnit::service_time)),
            average_queue_length: self.wait_line.average_len(window),
            max_queue_length: self.wait_line.max_len(),
            utilization: if capacity > 0.0 {
                total_busy / capacity
            } else {
                0.0
            },
            per_server,
            events_processed: self.metrics.events_processed(),
            end_time: self.clock.now(),
            truncated: self.truncated,
        }
    }
}

impl<V> SimulationEngine<V> {
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Time of the next arrival, if one is still scheduled.
    pub fn next_arrival(&self) -> Option<f64> {
        self.next_arrival
    }

    pub fn pending_departures(&self) -> usize {
        self.clock.pending_departures()
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn server(&self, id: ServerId) -> Option<&Server> {
        id.checked_sub(1).and_then(|index| self.servers.get(index))
    }

    pub fn wait_line(&self) -> &WaitLine {
        &self.wait_line
    }

    /// Units that completed service, in departure order.
    pub fn served_units(&self) -> &[ArrivalUnit] {
        &self.served
    }

    /// Units currently held by a server.
    pub fn in_service_units(&self) -> impl Iterator<Item = &ArrivalUnit> {
        self.servers.iter().filter_map(Server::current_unit)
    }

    /// Units currently in the wait-line, front first.
    pub fn waiting_units(&self) -> impl Iterator<Item = &ArrivalUnit> {
        self.wait_line.iter()
    }

    pub fn total_arrived(&self) -> u64 {
        self.total_arrived
    }

    pub fn metrics(&self) -> &EventMetrics {
        &self.metrics
    }

    pub fn variates(&self) -> &V {
        &self.variates
    }

    pub fn is_finished(&self) -> bool {
        self.finalized
    }
}

/// Builds an engine for `config` with its own [crate::variates::RandomVariates]
/// and runs it to completion.
pub fn simulate(config: &SimulationConfig) -> SimResult<SimulationReport> {
    let variates = config.variates();
    let mut engine = SimulationEngine::new(config.clone(), variates)?;
    Ok(engine.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::EventKind;
    use crate::variates::{RandomVariates, ScriptedVariates};

    /// Gap `1.0` between arrivals (rate 1), constant `service` time (rate 2).
    fn scripted(servers: usize, service: f64, horizon: f64) -> SimulationEngine<ScriptedVariates> {
        let config = SimulationConfig::new(horizon, 1.0, 2.0, servers);
        let variates = ScriptedVariates::new()
            .with_constant(1.0, 1.0)
            .and_then(|variates| variates.with_constant(2.0, service))
            .unwrap();
        SimulationEngine::new(config, variates).unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        for config in [
            SimulationConfig::new(0.0, 1.0, 1.0, 1),
            SimulationConfig::new(10.0, 0.0, 1.0, 1),
            SimulationConfig::new(10.0, 1.0, 0.0, 1),
            SimulationConfig::new(10.0, 1.0, 1.0, 0),
        ] {
            let err = SimulationEngine::new(config, ScriptedVariates::new())
                .err()
                .expect("construction must fail");
            assert!(err.is_invalid_parameter());
        }
    }

    #[test]
    fn failed_construction_draws_nothing() {
        let mut variates = ScriptedVariates::new();
        let failed =
            SimulationEngine::new(SimulationConfig::new(10.0, 1.0, 1.0, 0), &mut variates).is_err();
        assert!(failed);
        assert_eq!(variates.draws(), 0);
    }

    #[test]
    fn first_step_is_first_arrival() {
        let mut engine = scripted(1, 0.5, 10.0);
        let event = engine.step().expect("arrival");
        assert_eq!(
            event,
            SimEvent::Arrival {
                time: 1.0,
                unit: 1,
                server: Some(1)
            }
        );
        assert_eq!(engine.pending_departures(), 1);
        assert_eq!(engine.next_arrival(), Some(2.0));
    }

    #[test]
    fn departure_wins_a_tie_with_arrival() {
        // Service of 1.0 ends exactly when the next unit arrives.
        let mut engine = scripted(1, 1.0, 10.0);
        engine.step();
        let second = engine.step().expect("event at t=2");
        assert_eq!(second.kind(), EventKind::Departure);
        assert_eq!(second.time(), 2.0);
        let third = engine.step().expect("arrival at t=2");
        assert_eq!(
            third,
            SimEvent::Arrival {
                time: 2.0,
                unit: 2,
                server: Some(1)
            }
        );
        assert!(engine.wait_line().is_empty());
    }

    #[test]
    fn single_server_light_load_never_queues() {
        let mut engine = scripted(1, 0.5, 10.0);
        let report = engine.run();

        assert_eq!(report.total_arrived, 10);
        assert_eq!(report.total_served, 10);
        assert_eq!(report.average_wait, 0.0);
        assert_eq!(report.max_queue_length, 0);
        assert_eq!(report.average_queue_length, 0.0);
        // The tenth service starts at the horizon and earns no busy time.
        assert_eq!(report.utilization, 0.45);
        let arrivals: Vec<f64> = engine
            .served_units()
            .iter()
            .map(ArrivalUnit::arrival_time)
            .collect();
        assert_eq!(arrivals, (1..=10).map(f64::from).collect::<Vec<_>>());
    }

    #[test]
    fn no_arrival_after_horizon() {
        let mut engine = scripted(1, 0.5, 10.0);
        engine.run_with_hook(|engine, event| {
            if event.kind() == EventKind::Arrival {
                assert!(event.time() <= engine.horizon());
            }
        });
        assert_eq!(engine.next_arrival(), None);
    }

    #[test]
    fn finish_is_idempotent() {
        let mut engine = scripted(2, 3.0, 6.0);
        let first = engine.run();
        let second = engine.finish();
        assert_eq!(first, second);
        assert!(engine.step().is_none());
    }

    #[test]
    fn event_cap_truncates_and_finalizes() {
        let config = SimulationConfig::new(10.0, 1.0, 2.0, 1).with_max_events(1);
        let variates = ScriptedVariates::new()
            .with_constant(1.0, 1.0)
            .unwrap()
            .with_constant(2.0, 0.5)
            .unwrap();
        let mut engine = SimulationEngine::new(config, variates).unwrap();
        let report = engine.run();

        assert!(report.truncated);
        assert_eq!(report.events_processed, 1);
        assert_eq!(report.in_service_at_end, 1);
        // Unit 1 started at t=1, the moment the run stopped.
        assert_eq!(report.observed_time, 1.0);
        assert_eq!(report.per_server[0].busy_time, 0.0);
        assert_eq!(report.utilization, 0.0);
    }

    #[test]
    fn truncated_run_averages_over_observed_time() {
        // One server, gap 1, service 3: units 2 and 3 queue behind unit 1.
        let config = SimulationConfig::new(100.0, 1.0, 2.0, 1).with_max_events(3);
        let variates = ScriptedVariates::new()
            .with_constant(1.0, 1.0)
            .unwrap()
            .with_constant(2.0, 3.0)
            .unwrap();
        let mut engine = SimulationEngine::new(config, variates).unwrap();
        let report = engine.run();

        assert!(report.truncated);
        assert_eq!(engine.now(), 3.0);
        assert_eq!(report.observed_time, 3.0);
        assert_eq!(report.waiting_at_end, 2);
        // Length 1 over [2, 3); nothing beyond t=3.
        assert_eq!(engine.wait_line().time_integral(), 1.0);
        assert_eq!(report.average_queue_length, 1.0 / 3.0);
        // Busy from t=1 to t=3, short of the departure scheduled at t=4.
        assert_eq!(report.per_server[0].busy_time, 2.0);
        assert_eq!(report.utilization, 2.0 / 3.0);
    }

    #[test]
    fn zero_event_cap_reports_empty_window() {
        let config = SimulationConfig::new(10.0, 1.0, 2.0, 2).with_max_events(0);
        let report = SimulationEngine::new(config, ScriptedVariates::new())
            .unwrap()
            .run();

        assert!(report.truncated);
        assert_eq!(report.observed_time, 0.0);
        assert_eq!(report.utilization, 0.0);
        assert_eq!(report.average_queue_length, 0.0);
    }

    #[test]
    fn drained_run_observes_full_horizon() {
        let mut engine = scripted(2, 3.0, 6.0);
        let report = engine.run();
        assert!(!report.truncated);
        assert_eq!(report.observed_time, 6.0);
    }

    #[test]
    fn sequence_scripts_distinct_durations_at_equal_rates() {
        // Arrival and service rates coincide; the sequence alternates gap 1
        // and service 0.5 in draw order.
        let config = SimulationConfig::new(4.0, 1.0, 1.0, 1);
        let variates = ScriptedVariates::new().with_sequence([1.0, 0.5]).unwrap();
        let mut engine = SimulationEngine::new(config, variates).unwrap();
        let report = engine.run();

        assert_eq!(report.total_arrived, 4);
        assert_eq!(report.total_served, 4);
        assert_eq!(report.average_wait, 0.0);
        assert_eq!(report.average_service_time, 0.5);
        // The fourth service starts at the horizon and earns nothing.
        assert_eq!(report.per_server[0].busy_time, 1.5);
        assert_eq!(report.utilization, 0.375);
    }

    #[test]
    fn stalling_scripted_gap_is_rejected_up_front() {
        assert!(ScriptedVariates::new().with_constant(1.0, 0.0).is_err());
        assert!(ScriptedVariates::new().with_sequence([0.0]).is_err());
        assert!(ScriptedVariates::new().with_sequence([-0.5]).is_err());
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = SimulationConfig::new(200.0, 0.8, 0.5, 2);
        let a = SimulationEngine::new(config.clone(), RandomVariates::seeded(5))
            .unwrap()
            .run();
        let b = SimulationEngine::new(config, RandomVariates::seeded(5))
            .unwrap()
            .run();
        assert_eq!(a, b);
    }

    #[test]
    fn simulate_uses_config_seed() {
        let config = SimulationConfig::new(100.0, 0.5, 0.4, 2).with_seed(17);
        assert_eq!(simulate(&config).unwrap(), simulate(&config).unwrap());
        assert!(simulate(&config.with_servers(0)).is_err());
    }
}
