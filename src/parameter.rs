//! Central parameter trait and the built-in numeric parameter types.
//!
//! Parameters are identified by name, so the same logical parameter can be
//! recognised across processes that share one study.
//!
//! # Example
//!
//! ```
//! use paramtune::Trial;
//! use paramtune::parameter::{FloatParam, IntParam, Parameter};
//!
//! let mut trial = Trial::new(0, 0);
//!
//! let per = FloatParam::new("PER", 0.0, 2.0).suggest(&mut trial).unwrap();
//! let depth = IntParam::new("DEPTH", 1, 8).suggest(&mut trial).unwrap();
//! assert!((0.0..=2.0).contains(&per));
//! assert!((1..=8).contains(&depth));
//! ```

use core::fmt::Debug;

use crate::distribution::{Distribution, FloatDistribution, IntDistribution};
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::trial::Trial;

/// A trait for defining parameter types that can be suggested by a [`Trial`].
pub trait Parameter: Debug {
    /// The typed value returned after sampling.
    type Value;

    /// Returns the parameter name.
    fn name(&self) -> &str;

    /// Returns the distribution that this parameter samples from.
    fn distribution(&self) -> Distribution;

    /// Converts a raw [`ParamValue`] into the typed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the `ParamValue` variant doesn't match what this parameter expects.
    fn cast_param_value(&self, param_value: &ParamValue) -> Result<Self::Value>;

    /// Validates the parameter configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter configuration is invalid.
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Suggests a value for this parameter from the given trial.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the name was previously
    /// suggested with a different distribution.
    fn suggest(&self, trial: &mut Trial) -> Result<Self::Value>
    where
        Self: Sized,
    {
        trial.suggest_param(self)
    }
}

/// A floating-point parameter with optional log-scale and step size.
#[derive(Clone, Debug)]
pub struct FloatParam {
    name: String,
    low: f64,
    high: f64,
    log_scale: bool,
    step: Option<f64>,
}

impl FloatParam {
    /// Creates a new uniform float parameter with the given bounds.
    #[must_use]
    pub fn new(name: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
            log_scale: false,
            step: None,
        }
    }

    /// Enables log-scale sampling.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        self.log_scale = true;
        self
    }

    /// Sets a step size for discretized sampling.
    #[must_use]
    pub fn step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }
}

impl Parameter for FloatParam {
    type Value = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn distribution(&self) -> Distribution {
        Distribution::Float(FloatDistribution {
            low: self.low,
            high: self.high,
            log_scale: self.log_scale,
            step: self.step,
        })
    }

    fn cast_param_value(&self, param_value: &ParamValue) -> Result<f64> {
        match param_value {
            ParamValue::Float(v) => Ok(*v),
            ParamValue::Int(_) => Err(Error::Internal(
                "Float distribution should return Float value",
            )),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.low.is_finite() || !self.high.is_finite() || self.low > self.high {
            return Err(Error::InvalidBounds {
                low: self.low,
                high: self.high,
            });
        }
        if self.log_scale && self.low <= 0.0 {
            return Err(Error::InvalidLogBounds);
        }
        if matches!(self.step, Some(step) if step <= 0.0 || !step.is_finite()) {
            return Err(Error::InvalidStep);
        }
        Ok(())
    }
}

/// An integer parameter with optional log-scale and step size.
#[derive(Clone, Debug)]
pub struct IntParam {
    name: String,
    low: i64,
    high: i64,
    log_scale: bool,
    step: Option<i64>,
}

impl IntParam {
    /// Creates a new integer parameter with the given inclusive bounds.
    #[must_use]
    pub fn new(name: impl Into<String>, low: i64, high: i64) -> Self {
        Self {
            name: name.into(),
            low,
            high,
            log_scale: false,
            step: None,
        }
    }

    /// Enables log-scale sampling.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        self.log_scale = true;
        self
    }

    /// Sets a step size for discretized sampling.
    #[must_use]
    pub fn step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }
}

impl Parameter for IntParam {
    type Value = i64;

    fn name(&self) -> &str {
        &self.name
    }

    fn distribution(&self) -> Distribution {
        Distribution::Int(IntDistribution {
            low: self.low,
            high: self.high,
            log_scale: self.log_scale,
            step: self.step,
        })
    }

    fn cast_param_value(&self, param_value: &ParamValue) -> Result<i64> {
        match param_value {
            ParamValue::Int(v) => Ok(*v),
            ParamValue::Float(_) => Err(Error::Internal("Int distribution should return Int value")),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn validate(&self) -> Result<()> {
        if self.low > self.high {
            return Err(Error::InvalidBounds {
                low: self.low as f64,
                high: self.high as f64,
            });
        }
        if self.log_scale && self.low < 1 {
            return Err(Error::InvalidLogBounds);
        }
        if matches!(self.step, Some(step) if step <= 0) {
            return Err(Error::InvalidStep);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_param_rejects_inverted_bounds() {
        let p = FloatParam::new("x", 1.0, 0.0);
        assert!(matches!(p.validate(), Err(Error::InvalidBounds { .. })));
    }

    #[test]
    fn float_param_rejects_non_positive_log_bounds() {
        let p = FloatParam::new("x", 0.0, 1.0).log_scale();
        assert!(matches!(p.validate(), Err(Error::InvalidLogBounds)));
    }

    #[test]
    fn int_param_rejects_zero_step() {
        let p = IntParam::new("n", 0, 10).step(0);
        assert!(matches!(p.validate(), Err(Error::InvalidStep)));
    }

    #[test]
    fn degenerate_range_is_valid() {
        assert!(FloatParam::new("x", 2.0, 2.0).validate().is_ok());
        assert!(IntParam::new("n", 3, 3).validate().is_ok());
    }
}
