//! Uniform random draws for the arrival generator and the request handlers
//!
//! The model only ever asks for `uniform(low, high)`, so any source of such
//! draws can be injected. Seeded sources make runs reproducible; [`Midpoint`]
//! turns every draw into the mean and makes a run fully deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait UniformSource {
    /// A draw from Uniform(low, high), `low <= high`
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

impl<T: UniformSource + ?Sized> UniformSource for Box<T> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (**self).uniform(low, high)
    }
}

/// `StdRng` seeded from a `u64`
#[derive(Debug, Clone)]
pub struct SeededUniform {
    rng: StdRng,
}

impl SeededUniform {
    pub fn new(seed: u64) -> Self {
        SeededUniform {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng() -> Self {
        SeededUniform {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl UniformSource for SeededUniform {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.rng.random_range(low..=high)
    }
}

/// Always answers the centre of the interval
#[derive(Debug, Clone, Copy, Default)]
pub struct Midpoint;

impl UniformSource for Midpoint {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        (low + high) / 2.0
    }
}
