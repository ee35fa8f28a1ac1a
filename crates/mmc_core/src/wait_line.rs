//! FIFO wait-line with a time-weighted length integral.
//!
//! Every length change first integrates `length * dt` since the previous
//! change, so `time_integral() / horizon` is the time-average queue length once
//! [WaitLine::finalize] has extended the integral to the end of the horizon.

use std::collections::VecDeque;

use tracing::warn;

use crate::entities::ArrivalUnit;

#[derive(Debug, Clone, Default)]
pub struct WaitLine {
    units: VecDeque<ArrivalUnit>,
    max_len: usize,
    time_integral: f64,
    last_change: f64,
    finalized: bool,
}

impl WaitLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `unit` at the back.
    pub fn enqueue(&mut self, unit: ArrivalUnit, now: f64) {
        debug_assert!(!self.finalized, "enqueue after finalize");
        self.integrate(now);
        self.units.push_back(unit);
        self.max_len = self.max_len.max(self.units.len());
        self.last_change = now;
    }

    /// Removes the unit at the front, if any.
    pub fn dequeue(&mut self, now: f64) -> Option<ArrivalUnit> {
        self.integrate(now);
        let unit = self.units.pop_front();
        self.last_change = now;
        unit
    }

    /// Extends the integral to `end_time`. Only the first call has an effect.
    pub fn finalize(&mut self, end_time: f64) {
        if self.finalized {
            warn!(end_time, "wait-line already finalized; ignoring");
            return;
        }
        self.integrate(end_time);
        self.last_change = end_time;
        self.finalized = true;
    }

    fn integrate(&mut self, now: f64) {
        let elapsed = now - self.last_change;
        if elapsed > 0.0 {
            self.time_integral += self.units.len() as f64 * elapsed;
        }
    }

    /// Current number of waiting units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Longest the line has been.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Σ length × Δt accumulated so far.
    pub fn time_integral(&self) -> f64 {
        self.time_integral
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Time-average length over a window of length `window`.
    pub fn average_len(&self, window: f64) -> f64 {
        if window > 0.0 {
            self.time_integral / window
        } else {
            0.0
        }
    }

    /// Waiting units, front first.
    pub fn iter(&self) -> impl Iterator<Item = &ArrivalUnit> {
        self.units.iter()
    }
}
