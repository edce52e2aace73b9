//! Tree-Parzen Estimator (TPE) sampler implementation.
//!
//! TPE models the objective using two densities per parameter: one over the
//! values seen in promising trials and one over the rest. New values are
//! drawn from the promising density and ranked by the ratio between the two.

use parking_lot::Mutex;

use super::common::{from_internal, internal_bounds, sample_random, to_internal};
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::kde::KernelDensityEstimator;
use crate::param::ParamValue;
use crate::sampler::Sampler;
use crate::trial::TrialRecord;
use crate::types::Direction;

/// A univariate Tree-Parzen Estimator sampler.
///
/// Completed trials that contain the parameter are split at the `gamma`
/// quantile of their objective values (respecting the study direction).
/// Gaussian KDEs l(x) and g(x) are fitted to the good and bad groups, and
/// the best of `n_ei_candidates` draws from l(x) by l(x)/g(x) is returned.
///
/// Until `n_startup_trials` such trials exist, values are drawn uniformly.
///
/// # Examples
///
/// ```
/// use paramtune::sampler::TpeSampler;
///
/// let sampler = TpeSampler::new();
///
/// let sampler = TpeSampler::builder()
///     .gamma(0.15)
///     .n_startup_trials(20)
///     .n_ei_candidates(32)
///     .seed(42)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct TpeSampler {
    gamma: f64,
    n_startup_trials: usize,
    n_ei_candidates: usize,
    rng: Mutex<fastrand::Rng>,
}

impl TpeSampler {
    /// Creates a TPE sampler with default settings.
    ///
    /// - gamma: 0.25
    /// - `n_startup_trials`: 10
    /// - `n_ei_candidates`: 24
    #[must_use]
    pub fn new() -> Self {
        Self {
            gamma: 0.25,
            n_startup_trials: 10,
            n_ei_candidates: 24,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a builder for configuring a TPE sampler.
    #[must_use]
    pub fn builder() -> TpeSamplerBuilder {
        TpeSamplerBuilder::new()
    }

    /// Collects `(internal value, objective)` pairs for one parameter.
    fn observations(
        param_name: &str,
        distribution: &Distribution,
        history: &[TrialRecord],
    ) -> Vec<(f64, f64)> {
        history
            .iter()
            .filter_map(|t| {
                let objective = t.complete_value()?;
                if t.distributions.get(param_name)? != distribution {
                    return None;
                }
                let x = to_internal(t.params.get(param_name)?, distribution)?;
                (x.is_finite() && objective.is_finite()).then_some((x, objective))
            })
            .collect()
    }

    /// Splits observations into (good, bad) internal values.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn split(&self, mut obs: Vec<(f64, f64)>, direction: Direction) -> (Vec<f64>, Vec<f64>) {
        obs.sort_by(|a, b| {
            let ord = a.1.total_cmp(&b.1);
            match direction {
                Direction::Minimize => ord,
                Direction::Maximize => ord.reverse(),
            }
        });

        let n_good = ((obs.len() as f64 * self.gamma).ceil() as usize)
            .max(1)
            .min(obs.len() - 1);

        let bad = obs.split_off(n_good);
        (
            obs.into_iter().map(|(x, _)| x).collect(),
            bad.into_iter().map(|(x, _)| x).collect(),
        )
    }

    fn sample_tpe(
        &self,
        distribution: &Distribution,
        good: Vec<f64>,
        bad: Vec<f64>,
        rng: &mut fastrand::Rng,
    ) -> Result<ParamValue> {
        let (low, high) = internal_bounds(distribution);
        let l_kde = KernelDensityEstimator::new(good)?;
        let g_kde = KernelDensityEstimator::new(bad)?;

        let mut best_candidate = low;
        let mut best_ratio = f64::NEG_INFINITY;

        for _ in 0..self.n_ei_candidates {
            let candidate = l_kde.sample(rng).clamp(low, high);

            let l_density = l_kde.pdf(candidate);
            let g_density = g_kde.pdf(candidate);

            let ratio = if g_density < f64::EPSILON {
                if l_density > f64::EPSILON {
                    f64::INFINITY
                } else {
                    0.0
                }
            } else {
                l_density / g_density
            };

            if ratio > best_ratio {
                best_ratio = ratio;
                best_candidate = candidate;
            }
        }

        Ok(from_internal(best_candidate, distribution))
    }
}

impl Default for TpeSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for TpeSampler {
    fn sample(
        &self,
        distribution: &Distribution,
        param_name: &str,
        direction: Direction,
        history: &[TrialRecord],
    ) -> ParamValue {
        let mut rng = self.rng.lock();
        let obs = Self::observations(param_name, distribution, history);

        if obs.len() < self.n_startup_trials.max(2) {
            return sample_random(&mut rng, distribution);
        }

        let (good, bad) = self.split(obs, direction);
        match self.sample_tpe(distribution, good, bad, &mut rng) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(param = param_name, error = %e, "TPE fell back to random sampling");
                sample_random(&mut rng, distribution)
            }
        }
    }
}

/// Builder for configuring a [`TpeSampler`].
#[derive(Clone, Debug)]
pub struct TpeSamplerBuilder {
    gamma: f64,
    n_startup_trials: usize,
    n_ei_candidates: usize,
    seed: Option<u64>,
}

impl TpeSamplerBuilder {
    /// Creates a builder with the default settings of [`TpeSampler::new`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            gamma: 0.25,
            n_startup_trials: 10,
            n_ei_candidates: 24,
            seed: None,
        }
    }

    /// Sets the fraction of trials considered "good".
    #[must_use]
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the number of random trials before TPE kicks in.
    #[must_use]
    pub fn n_startup_trials(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    /// Sets the number of candidates evaluated per suggestion.
    #[must_use]
    pub fn n_ei_candidates(mut self, n: usize) -> Self {
        self.n_ei_candidates = n;
        self
    }

    /// Seeds the sampler's RNG.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the sampler.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGamma` if gamma is not in (0.0, 1.0).
    pub fn build(self) -> Result<TpeSampler> {
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(Error::InvalidGamma(self.gamma));
        }

        let rng = match self.seed {
            Some(s) => fastrand::Rng::with_seed(s),
            None => fastrand::Rng::new(),
        };

        Ok(TpeSampler {
            gamma: self.gamma,
            n_startup_trials: self.n_startup_trials,
            n_ei_candidates: self.n_ei_candidates.max(1),
            rng: Mutex::new(rng),
        })
    }
}

impl Default for TpeSamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
