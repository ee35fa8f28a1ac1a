//! Random variates for inter-arrival and service durations.
//!
//! Every duration the engine needs is drawn through a [VariateSource] it owns.
//! A run is therefore exactly as reproducible as its source: seed a
//! [RandomVariates] for repeatable stochastic runs, or hand the engine a
//! [ScriptedVariates] to get fixed, hand-checkable timelines in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{SimError, SimResult};

/// Largest uniform draw fed to the inverse CDF; keeps `ln(1 - u)` finite.
pub const MAX_UNIFORM: f64 = 0.999_999;

/// A validated event rate (events per unit of simulated time).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Rate(f64);

impl Rate {
    pub fn new(value: f64) -> SimResult<Self> {
        Self::named("rate", value)
    }

    /// Like [Rate::new], reporting failures against `name`.
    pub fn named(name: &'static str, value: f64) -> SimResult<Self> {
        if value > 0.0 && value.is_finite() {
            Ok(Self(value))
        } else {
            Err(SimError::not_positive(name, value))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Mean duration between events at this rate.
    pub fn mean(self) -> f64 {
        1.0 / self.0
    }
}

/// Source of the random durations used by a simulation run.
///
/// Implementors provide a uniform draw in `[0, 1)` and an exponential draw for
/// an already-validated [Rate]; the checked `exponential`/`uniform` entry
/// points are shared.
pub trait VariateSource: std::fmt::Debug {
    /// Uniform draw in `[0, 1)`.
    fn sample_unit(&mut self) -> f64;

    /// Exponential duration with the given rate.
    fn sample_exponential(&mut self, rate: Rate) -> f64;

    /// Exponential duration; fails if `rate` is not positive.
    fn exponential(&mut self, rate: f64) -> SimResult<f64> {
        let rate = Rate::new(rate)?;
        Ok(self.sample_exponential(rate))
    }

    /// Uniform value in `[min, max)`; fails unless `min < max`.
    fn uniform(&mut self, min: f64, max: f64) -> SimResult<f64> {
        if min >= max || min.is_nan() || max.is_nan() {
            return Err(SimError::InvalidBounds { min, max });
        }
        Ok(min + self.sample_unit() * (max - min))
    }
}

impl<V: VariateSource + ?Sized> VariateSource for &mut V {
    fn sample_unit(&mut self) -> f64 {
        (**self).sample_unit()
    }

    fn sample_exponential(&mut self, rate: Rate) -> f64 {
        (**self).sample_exponential(rate)
    }
}

impl<V: VariateSource + ?Sized> VariateSource for Box<V> {
    fn sample_unit(&mut self) -> f64 {
        (**self).sample_unit()
    }

    fn sample_exponential(&mut self, rate: Rate) -> f64 {
        (**self).sample_exponential(rate)
    }
}

/// Inverse-CDF variates on top of a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomVariates<R = StdRng> {
    rng: R,
}

impl RandomVariates<StdRng> {
    /// Reproducible source: the same seed yields the same stream.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Unseeded source drawing its state from the OS.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> RandomVariates<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng + std::fmt::Debug> VariateSource for RandomVariates<R> {
    fn sample_unit(&mut self) -> f64 {
        let u: f64 = self.rng.gen();
        if u >= 1.0 {
            MAX_UNIFORM
        } else {
            u
        }
    }

    fn sample_exponential(&mut self, rate: Rate) -> f64 {
        let u = self.sample_unit();
        -(1.0 - u).ln() / rate.get()
    }
}

/// Deterministic variates for tests and what-if runs.
///
/// Exponential draws come from, in order of precedence: the scripted
/// sequence, served in draw order and repeated once exhausted; the constant
/// registered for that exact rate; the distribution mean `1 / rate`. Uniform
/// draws return the midpoint of the requested interval.
///
/// Scripted durations must be positive and finite so simulated time always
/// moves forward.
#[derive(Debug, Clone, Default)]
pub struct ScriptedVariates {
    constants: Vec<(f64, f64)>,
    sequence: Vec<f64>,
    draws: u64,
}

impl ScriptedVariates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every exponential draw at `rate` returns `value`.
    pub fn with_constant(mut self, rate: f64, value: f64) -> SimResult<Self> {
        let value = scripted_duration(value)?;
        match self.constants.iter_mut().find(|(r, _)| *r == rate) {
            Some(entry) => entry.1 = value,
            None => self.constants.push((rate, value)),
        }
        Ok(self)
    }

    /// Exponential draws return `values` in order, whatever the rate,
    /// starting over after the last one.
    ///
    /// The engine draws the first inter-arrival gap at construction, then for
    /// each arrival the service time (if it starts service at once) before
    /// the next gap.
    pub fn with_sequence(mut self, values: impl IntoIterator<Item = f64>) -> SimResult<Self> {
        self.sequence = values
            .into_iter()
            .map(scripted_duration)
            .collect::<SimResult<_>>()?;
        Ok(self)
    }

    /// Number of exponential draws served so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

fn scripted_duration(value: f64) -> SimResult<f64> {
    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::not_positive("scripted duration", value))
    }
}

impl VariateSource for ScriptedVariates {
    fn sample_unit(&mut self) -> f64 {
        0.5
    }

    fn sample_exponential(&mut self, rate: Rate) -> f64 {
        let index = self.draws;
        self.draws += 1;
        if !self.sequence.is_empty() {
            return self.sequence[index as usize % self.sequence.len()];
        }
        let rate = rate.get();
        self.constants
            .iter()
            .find(|(r, _)| *r == rate)
            .map(|(_, value)| *value)
            .unwrap_or(1.0 / rate)
    }
}
