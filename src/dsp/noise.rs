//! White noise source for percussive voices.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Uniform white noise in [-1, 1]. Each voice gets its own seeded stream so
/// renders are deterministic.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: SmallRng,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        NoiseSource {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        self.rng.gen_range(-1.0..1.0)
    }
}
