//! Trial implementation for tracking sampled parameters and trial state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::parameter::Parameter;
use crate::sampler::Sampler;
use crate::types::{Direction, TrialState};

/// A user attribute value attached to a trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// A boolean flag.
    Bool(bool),
    /// An integer attribute.
    Int(i64),
    /// A floating-point attribute.
    Float(f64),
    /// A string attribute.
    String(String),
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::String(v.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::String(v)
    }
}

impl core::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::String(v) => f.write_str(v),
        }
    }
}

/// A persisted trial: parameters, distributions, state and result.
///
/// Records are what storage backends hand back and what samplers learn
/// from. Only records in state [`Complete`](TrialState::Complete) carry a
/// value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Storage-wide unique identifier.
    pub id: u64,
    /// 0-based position of the trial inside its study.
    pub number: u64,
    /// The state of the trial.
    pub state: TrialState,
    /// The objective value, present for completed trials.
    pub value: Option<f64>,
    /// Sampled parameter values, keyed by name.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,
    /// Distributions the parameters were drawn from, keyed by name.
    #[serde(default)]
    pub distributions: BTreeMap<String, Distribution>,
    /// User-defined attributes stored during the trial.
    #[serde(default)]
    pub user_attrs: BTreeMap<String, AttrValue>,
    /// When the trial was reserved.
    pub datetime_start: Option<DateTime<Utc>>,
    /// When the trial finished.
    pub datetime_complete: Option<DateTime<Utc>>,
}

impl TrialRecord {
    /// Creates a running record with no parameters.
    #[must_use]
    pub fn running(id: u64, number: u64) -> Self {
        Self {
            id,
            number,
            state: TrialState::Running,
            value: None,
            params: BTreeMap::new(),
            distributions: BTreeMap::new(),
            user_attrs: BTreeMap::new(),
            datetime_start: Some(Utc::now()),
            datetime_complete: None,
        }
    }

    /// Returns the completed value, or `None` for running and failed trials.
    #[must_use]
    pub fn complete_value(&self) -> Option<f64> {
        match self.state {
            TrialState::Complete => self.value,
            TrialState::Running | TrialState::Failed => None,
        }
    }

    /// Wall-clock duration, if the trial has finished.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::TimeDelta> {
        Some(self.datetime_complete? - self.datetime_start?)
    }
}

/// A trial represents a single evaluation of the objective function.
///
/// Trials progress through states: Running -> Complete/Failed. When
/// created through [`Study::ask`](crate::Study::ask) the trial receives the
/// study's sampler and a view of the finished trials for informed sampling.
#[derive(Clone)]
pub struct Trial {
    id: u64,
    number: u64,
    state: TrialState,
    params: BTreeMap<String, ParamValue>,
    distributions: BTreeMap<String, Distribution>,
    user_attrs: BTreeMap<String, AttrValue>,
    fixed_params: BTreeMap<String, ParamValue>,
    datetime_start: DateTime<Utc>,
    direction: Direction,
    sampler: Option<Arc<dyn Sampler>>,
    history: Option<Arc<RwLock<Vec<TrialRecord>>>>,
}

impl core::fmt::Debug for Trial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trial")
            .field("id", &self.id)
            .field("number", &self.number)
            .field("state", &self.state)
            .field("params", &self.params)
            .field("user_attrs", &self.user_attrs)
            .field("has_sampler", &self.sampler.is_some())
            .finish_non_exhaustive()
    }
}

impl Trial {
    /// Creates a detached trial that samples uniformly at random.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtune::Trial;
    ///
    /// let trial = Trial::new(7, 0);
    /// assert_eq!(trial.id(), 7);
    /// assert_eq!(trial.number(), 0);
    /// ```
    #[must_use]
    pub fn new(id: u64, number: u64) -> Self {
        Self {
            id,
            number,
            state: TrialState::Running,
            params: BTreeMap::new(),
            distributions: BTreeMap::new(),
            user_attrs: BTreeMap::new(),
            fixed_params: BTreeMap::new(),
            datetime_start: Utc::now(),
            direction: Direction::Minimize,
            sampler: None,
            history: None,
        }
    }

    pub(crate) fn with_sampler(
        record: &TrialRecord,
        direction: Direction,
        sampler: Arc<dyn Sampler>,
        history: Arc<RwLock<Vec<TrialRecord>>>,
    ) -> Self {
        let mut trial = Self::new(record.id, record.number);
        if let Some(start) = record.datetime_start {
            trial.datetime_start = start;
        }
        trial.direction = direction;
        trial.sampler = Some(sampler);
        trial.history = Some(history);
        trial
    }

    /// Forces the given parameter values for subsequent suggestions.
    pub(crate) fn set_fixed_params(&mut self, params: BTreeMap<String, ParamValue>) {
        self.fixed_params = params;
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn sample_value(&self, name: &str, distribution: &Distribution) -> ParamValue {
        if let Some(fixed) = self.fixed_params.get(name).copied() {
            let fixed = match (fixed, distribution) {
                (ParamValue::Int(v), Distribution::Float(_)) => Some(ParamValue::Float(v as f64)),
                (ParamValue::Float(v), Distribution::Int(_)) if v.fract() == 0.0 => {
                    Some(ParamValue::Int(v as i64))
                }
                (ParamValue::Float(_), Distribution::Int(_)) => None,
                (value, _) => Some(value),
            };
            if let Some(fixed) = fixed.filter(|v| distribution.contains(v.as_f64())) {
                return fixed;
            }
            tracing::warn!(param = name, "enqueued value does not fit the distribution, sampling instead");
        }

        if let (Some(sampler), Some(history)) = (&self.sampler, &self.history) {
            let history = history.read();
            sampler.sample(distribution, name, self.direction, &history)
        } else {
            use crate::sampler::random::RandomSampler;
            RandomSampler::new().sample(distribution, name, self.direction, &[])
        }
    }

    /// Returns the storage-wide unique ID of this trial.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the 0-based number of this trial inside its study.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the current state of this trial.
    #[must_use]
    pub fn state(&self) -> TrialState {
        self.state
    }

    /// Returns the sampled parameters.
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }

    /// Returns the parameter distributions.
    #[must_use]
    pub fn distributions(&self) -> &BTreeMap<String, Distribution> {
        &self.distributions
    }

    /// Returns the user attributes recorded so far.
    #[must_use]
    pub fn user_attrs(&self) -> &BTreeMap<String, AttrValue> {
        &self.user_attrs
    }

    /// Stores a user attribute, replacing any previous value for `key`.
    pub fn set_user_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.user_attrs.insert(key.into(), value.into());
    }

    /// Suggests a parameter value using a [`Parameter`] definition.
    ///
    /// Suggesting the same name twice with the same distribution returns the
    /// cached value.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter fails validation or was previously
    /// suggested with a different distribution.
    pub fn suggest_param<P: Parameter>(&mut self, param: &P) -> Result<P::Value> {
        param.validate()?;

        let name = param.name();
        let distribution = param.distribution();

        if let Some(existing) = self.distributions.get(name) {
            if *existing == distribution {
                if let Some(value) = self.params.get(name) {
                    return param.cast_param_value(value);
                }
            }
            return Err(Error::ParameterConflict {
                name: name.to_owned(),
                reason: "parameter was previously sampled with different configuration or type"
                    .to_string(),
            });
        }

        let value = self.sample_value(name, &distribution);
        let result = param.cast_param_value(&value)?;

        self.distributions.insert(name.to_owned(), distribution);
        self.params.insert(name.to_owned(), value);

        Ok(result)
    }

    /// Finishes the trial, producing the record that storage persists.
    pub(crate) fn into_record(mut self, value: Option<f64>, state: TrialState) -> TrialRecord {
        self.state = state;
        TrialRecord {
            id: self.id,
            number: self.number,
            state,
            value: match state {
                TrialState::Complete => value,
                TrialState::Running | TrialState::Failed => None,
            },
            params: self.params,
            distributions: self.distributions,
            user_attrs: self.user_attrs,
            datetime_start: Some(self.datetime_start),
            datetime_complete: Some(Utc::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{FloatParam, IntParam};

    #[test]
    fn repeated_suggest_returns_cached_value() {
        let mut trial = Trial::new(0, 0);
        let p = FloatParam::new("x", 0.0, 1.0);
        let a = p.suggest(&mut trial).unwrap();
        let b = p.suggest(&mut trial).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn conflicting_distribution_is_rejected() {
        let mut trial = Trial::new(0, 0);
        FloatParam::new("x", 0.0, 1.0).suggest(&mut trial).unwrap();
        let err = IntParam::new("x", 0, 10).suggest(&mut trial).unwrap_err();
        assert!(matches!(err, Error::ParameterConflict { .. }));
    }

    #[test]
    fn fixed_params_take_precedence() {
        let mut trial = Trial::new(0, 0);
        trial.set_fixed_params(BTreeMap::from([("x".to_owned(), ParamValue::Int(3))]));
        let x = FloatParam::new("x", 0.0, 5.0).suggest(&mut trial).unwrap();
        assert_eq!(x, 3.0);
    }

    #[test]
    fn fixed_params_outside_bounds_fall_back_to_sampling() {
        let mut trial = Trial::new(0, 0);
        trial.set_fixed_params(BTreeMap::from([("x".to_owned(), ParamValue::Float(9.0))]));
        let x = FloatParam::new("x", 0.0, 1.0).suggest(&mut trial).unwrap();
        assert!((0.0..=1.0).contains(&x));
    }

    #[test]
    fn failed_record_drops_value() {
        let trial = Trial::new(1, 0);
        let record = trial.into_record(Some(4.0), TrialState::Failed);
        assert_eq!(record.value, None);
        assert_eq!(record.state, TrialState::Failed);
        assert!(record.datetime_complete.is_some());
    }
}
