//! Sampler trait and implementations for parameter sampling.

mod common;
pub mod random;
pub mod tpe;

use core::str::FromStr;

pub use random::RandomSampler;
pub use tpe::{TpeSampler, TpeSamplerBuilder};

use crate::distribution::Distribution;
use crate::param::ParamValue;
use crate::trial::TrialRecord;
use crate::types::Direction;

/// Trait for pluggable parameter sampling strategies.
///
/// Samplers produce a value for one named parameter given its distribution
/// and the trials recorded so far. The trait requires `Send + Sync` so one
/// sampler can serve every trial of a study.
pub trait Sampler: Send + Sync {
    /// Samples a parameter value from the given distribution.
    ///
    /// # Arguments
    ///
    /// * `distribution` - The parameter distribution to sample from.
    /// * `param_name` - The name of the parameter being sampled.
    /// * `direction` - Whether the study minimizes or maximizes.
    /// * `history` - Trials recorded so far, in any state.
    ///
    /// The returned value must lie inside `distribution`.
    fn sample(
        &self,
        distribution: &Distribution,
        param_name: &str,
        direction: Direction,
        history: &[TrialRecord],
    ) -> ParamValue;
}

impl<S: Sampler + ?Sized> Sampler for Box<S> {
    fn sample(
        &self,
        distribution: &Distribution,
        param_name: &str,
        direction: Direction,
        history: &[TrialRecord],
    ) -> ParamValue {
        (**self).sample(distribution, param_name, direction, history)
    }
}

/// Names of the built-in samplers, for configuration surfaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SamplerKind {
    /// [`TpeSampler`].
    #[default]
    Tpe,
    /// [`RandomSampler`].
    Random,
}

impl SamplerKind {
    /// Builds the sampler, seeding it when `seed` is given.
    ///
    /// # Errors
    ///
    /// Returns the TPE builder's validation error, if any.
    pub fn build(self, seed: Option<u64>) -> crate::error::Result<Box<dyn Sampler>> {
        Ok(match (self, seed) {
            (SamplerKind::Random, Some(seed)) => Box::new(RandomSampler::with_seed(seed)),
            (SamplerKind::Random, None) => Box::new(RandomSampler::new()),
            (SamplerKind::Tpe, Some(seed)) => Box::new(TpeSampler::builder().seed(seed).build()?),
            (SamplerKind::Tpe, None) => Box::new(TpeSampler::builder().build()?),
        })
    }
}

impl FromStr for SamplerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tpe" => Ok(SamplerKind::Tpe),
            "random" => Ok(SamplerKind::Random),
            other => Err(format!("unknown sampler '{other}' (expected tpe or random)")),
        }
    }
}

impl core::fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            SamplerKind::Tpe => "tpe",
            SamplerKind::Random => "random",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::FloatDistribution;

    fn unit() -> Distribution {
        Distribution::Float(FloatDistribution {
            low: 0.0,
            high: 1.0,
            log_scale: false,
            step: None,
        })
    }

    #[test]
    fn seeded_kinds_are_reproducible() {
        for kind in [SamplerKind::Tpe, SamplerKind::Random] {
            let a = kind.build(Some(5)).unwrap();
            let b = kind.build(Some(5)).unwrap();
            let dist = unit();
            for _ in 0..5 {
                assert_eq!(
                    a.sample(&dist, "x", Direction::Minimize, &[]),
                    b.sample(&dist, "x", Direction::Minimize, &[])
                );
            }
        }
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("TPE".parse::<SamplerKind>(), Ok(SamplerKind::Tpe));
        assert_eq!("random".parse::<SamplerKind>(), Ok(SamplerKind::Random));
        assert!("grid".parse::<SamplerKind>().is_err());
    }
}
