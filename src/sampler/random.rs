//! Random sampler implementation.

use parking_lot::Mutex;

use super::common::sample_random;
use crate::distribution::Distribution;
use crate::param::ParamValue;
use crate::sampler::Sampler;
use crate::trial::TrialRecord;
use crate::types::Direction;

/// A sampler that draws uniformly from each distribution.
///
/// It ignores the trial history, respects log scale and step size, and is
/// used by [`TpeSampler`](super::TpeSampler) during its startup phase.
///
/// # Examples
///
/// ```
/// use paramtune::sampler::RandomSampler;
///
/// let sampler = RandomSampler::new();
/// let seeded = RandomSampler::with_seed(42);
/// ```
pub struct RandomSampler {
    rng: Mutex<fastrand::Rng>,
}

impl RandomSampler {
    /// Creates a new random sampler with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a new random sampler with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn sample(
        &self,
        distribution: &Distribution,
        _param_name: &str,
        _direction: Direction,
        _history: &[TrialRecord],
    ) -> ParamValue {
        sample_random(&mut self.rng.lock(), distribution)
    }
}
