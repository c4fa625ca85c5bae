//! Random source behind the simulated telemetry.
//!
//! Production code draws from an OS-seeded `StdRng`; tests inject a seeded
//! generator or a `ScriptedRandom` to pin every derived value.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub trait RandomSource: Send {
    /// Uniform integer in `[low, high)`. Returns `low` when the range is empty.
    fn range(&mut self, low: i64, high: i64) -> i64;

    /// `true` with the given probability.
    fn chance(&mut self, probability: f64) -> bool;
}

#[derive(Debug)]
pub struct RngSource<R>(R);

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl<R: RngCore + Send> RandomSource for RngSource<R> {
    fn range(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.0.random_range(low..high)
    }

    fn chance(&mut self, probability: f64) -> bool {
        if probability.is_nan() {
            return false;
        }
        self.0.random_bool(probability.clamp(0.0, 1.0))
    }
}

/// Replays queued draws in order. Range values are clamped into the requested
/// range; an exhausted queue yields `low` and `false`.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRandom {
    ranges: VecDeque<i64>,
    chances: VecDeque<bool>,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranges(mut self, values: impl IntoIterator<Item = i64>) -> Self {
        self.ranges.extend(values);
        self
    }

    pub fn with_chances(mut self, values: impl IntoIterator<Item = bool>) -> Self {
        self.chances.extend(values);
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn range(&mut self, low: i64, high: i64) -> i64 {
        match self.ranges.pop_front() {
            Some(value) if high > low => value.clamp(low, high - 1),
            _ => low,
        }
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }
}

pub type SharedRandom = Arc<Mutex<Box<dyn RandomSource>>>;

pub fn shared(source: impl RandomSource + 'static) -> SharedRandom {
    Arc::new(Mutex::new(Box::new(source)))
}

/// A panic while drawing cannot leave the generator in a state worth refusing.
pub(crate) fn lock(random: &SharedRandom) -> MutexGuard<'_, Box<dyn RandomSource>> {
    random.lock().unwrap_or_else(PoisonError::into_inner)
}
