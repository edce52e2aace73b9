//! Parameter distribution types.

use serde::{Deserialize, Serialize};

/// Distribution for floating-point parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatDistribution {
    /// Lower bound (inclusive).
    pub low: f64,
    /// Upper bound (inclusive).
    pub high: f64,
    /// Whether to sample in log space.
    #[serde(default)]
    pub log_scale: bool,
    /// Optional step size for discretization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

/// Distribution for integer parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntDistribution {
    /// Lower bound (inclusive).
    pub low: i64,
    /// Upper bound (inclusive).
    pub high: i64,
    /// Whether to sample in log space.
    #[serde(default)]
    pub log_scale: bool,
    /// Optional step size for discretization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
}

/// Enum wrapping all parameter distribution types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    /// A floating-point distribution.
    Float(FloatDistribution),
    /// An integer distribution.
    Int(IntDistribution),
}

impl Distribution {
    /// Returns `true` if `value` lies inside the distribution's bounds.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        match self {
            Distribution::Float(d) => (d.low..=d.high).contains(&value),
            Distribution::Int(d) => (d.low as f64..=d.high as f64).contains(&value),
        }
    }
}
