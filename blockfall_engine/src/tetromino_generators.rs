use rand::{
    self,
    distributions::{Distribution, Uniform},
    rngs::StdRng,
    Rng, SeedableRng,
};

use crate::Tetromino;

/// Uniformly random tetromino generation: every draw is independent, each type with chance 1/7.
#[derive(Clone, Debug)]
pub struct UniformGenerator<R: Rng = StdRng> {
    rng: R,
    uniform: Uniform<usize>,
}

impl UniformGenerator<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible sequence of pieces for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for UniformGenerator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> UniformGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            uniform: Uniform::from(0..Tetromino::ALL.len()),
        }
    }
}

impl<R: Rng> Iterator for UniformGenerator<R> {
    type Item = Tetromino;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.uniform.sample(&mut self.rng);
        // SAFETY: 0 <= idx <= 6.
        Some(Tetromino::ALL[idx])
    }
}
