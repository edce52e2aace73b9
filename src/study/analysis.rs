use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::trial::TrialRecord;
use crate::types::Direction;

use super::Study;

impl Study {
    /// Return every trial of the study, freshly read from storage and
    /// ordered by number.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trials cannot be read.
    pub fn trials(&self) -> Result<Vec<TrialRecord>> {
        self.refresh()?;
        Ok(self.history.read().clone())
    }

    /// Return the number of trials in any state.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trials cannot be read.
    pub fn n_trials(&self) -> Result<usize> {
        self.refresh()?;
        Ok(self.history.read().len())
    }

    /// Return the completed trial with the best value.
    ///
    /// The "best" trial depends on the optimization direction. Ties go to
    /// the earliest trial.
    ///
    /// # Errors
    ///
    /// Returns [`NoCompletedTrials`](Error::NoCompletedTrials) if no trial
    /// has completed, or a storage error.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtune::prelude::*;
    ///
    /// let study = Study::builder().maximize().create().unwrap();
    /// assert!(study.best_trial().is_err());
    ///
    /// let t = study.ask().unwrap();
    /// study.complete_trial(t, 3.0).unwrap();
    /// let t = study.ask().unwrap();
    /// study.complete_trial(t, 8.0).unwrap();
    ///
    /// assert_eq!(study.best_trial().unwrap().number, 1);
    /// ```
    pub fn best_trial(&self) -> Result<TrialRecord> {
        self.top_trials(1)?
            .into_iter()
            .next()
            .ok_or(Error::NoCompletedTrials)
    }

    /// Return the best objective value found so far.
    ///
    /// # Errors
    ///
    /// Returns [`NoCompletedTrials`](Error::NoCompletedTrials) if no trial
    /// has completed, or a storage error.
    pub fn best_value(&self) -> Result<f64> {
        self.best_trial()?
            .complete_value()
            .ok_or(Error::Internal("completed trial without a value"))
    }

    /// Return the parameters of the best trial.
    ///
    /// # Errors
    ///
    /// Returns [`NoCompletedTrials`](Error::NoCompletedTrials) if no trial
    /// has completed, or a storage error.
    pub fn best_params(&self) -> Result<BTreeMap<String, ParamValue>> {
        Ok(self.best_trial()?.params)
    }

    /// Return up to `n` completed trials, best first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trials cannot be read.
    pub fn top_trials(&self, n: usize) -> Result<Vec<TrialRecord>> {
        let mut complete: Vec<(f64, TrialRecord)> = self
            .trials()?
            .into_iter()
            .filter_map(|t| t.complete_value().map(|v| (v, t)))
            .collect();

        // Stable sort keeps trial-number order among equal values.
        match self.direction {
            Direction::Minimize => complete.sort_by(|a, b| a.0.total_cmp(&b.0)),
            Direction::Maximize => complete.sort_by(|a, b| b.0.total_cmp(&a.0)),
        }

        Ok(complete.into_iter().take(n).map(|(_, t)| t).collect())
    }
}
