//! Shared distribution-level utilities used across samplers.

use crate::distribution::Distribution;
use crate::param::ParamValue;
use crate::rng_util;

/// Compute internal-space bounds (log space for log distributions).
#[allow(clippy::cast_precision_loss)]
pub(crate) fn internal_bounds(distribution: &Distribution) -> (f64, f64) {
    match distribution {
        Distribution::Float(d) => {
            if d.log_scale {
                (d.low.ln(), d.high.ln())
            } else {
                (d.low, d.high)
            }
        }
        Distribution::Int(d) => {
            if d.log_scale {
                ((d.low as f64).ln(), (d.high as f64).ln())
            } else {
                (d.low as f64, d.high as f64)
            }
        }
    }
}

/// Convert an internal-space value back to a `ParamValue`, snapping to the
/// step grid and clamping to the bounds.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn from_internal(value: f64, distribution: &Distribution) -> ParamValue {
    match distribution {
        Distribution::Float(d) => {
            let v = if d.log_scale { value.exp() } else { value };
            let v = if let Some(step) = d.step {
                let k = ((v - d.low) / step).round();
                d.low + k * step
            } else {
                v
            };
            ParamValue::Float(v.clamp(d.low, d.high))
        }
        Distribution::Int(d) => {
            let v = if d.log_scale { value.exp() } else { value };
            let v = if let Some(step) = d.step {
                let k = ((v - d.low as f64) / step as f64).round() as i64;
                d.low.saturating_add(k.saturating_mul(step))
            } else {
                v.round() as i64
            };
            ParamValue::Int(v.clamp(d.low, d.high))
        }
    }
}

/// Convert a `ParamValue` to its internal-space representation.
///
/// Returns `None` when the value kind does not match the distribution.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn to_internal(value: &ParamValue, distribution: &Distribution) -> Option<f64> {
    match (value, distribution) {
        (ParamValue::Float(v), Distribution::Float(d)) => {
            Some(if d.log_scale { v.ln() } else { *v })
        }
        (ParamValue::Int(v), Distribution::Int(d)) => {
            let v = *v as f64;
            Some(if d.log_scale { v.ln() } else { v })
        }
        _ => None,
    }
}

/// Sample a random value for any distribution.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn sample_random(rng: &mut fastrand::Rng, distribution: &Distribution) -> ParamValue {
    match distribution {
        Distribution::Float(d) => {
            let value = if d.log_scale {
                let v = rng_util::f64_range(rng, d.low.ln(), d.high.ln()).exp();
                if let Some(step) = d.step {
                    let k = ((v - d.low) / step).round();
                    d.low + k * step
                } else {
                    v
                }
            } else if let Some(step) = d.step {
                let n_steps = ((d.high - d.low) / step).floor() as i64;
                let k = rng.i64(0..=n_steps);
                d.low + (k as f64) * step
            } else {
                rng_util::f64_range(rng, d.low, d.high)
            };
            ParamValue::Float(value.clamp(d.low, d.high))
        }
        Distribution::Int(d) => {
            let value = if d.log_scale {
                let v = rng_util::f64_range(rng, (d.low as f64).ln(), (d.high as f64).ln()).exp();
                if let Some(step) = d.step {
                    let k = ((v - d.low as f64) / step as f64).round() as i64;
                    d.low.saturating_add(k.saturating_mul(step))
                } else {
                    v.round() as i64
                }
            } else if let Some(step) = d.step {
                let n_steps = (d.high - d.low) / step;
                let k = rng.i64(0..=n_steps);
                d.low + k * step
            } else {
                rng.i64(d.low..=d.high)
            };
            ParamValue::Int(value.clamp(d.low, d.high))
        }
    }
}
