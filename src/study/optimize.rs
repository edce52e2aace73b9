use core::ops::ControlFlow;

use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::types::TrialState;

use super::Study;

impl Study {
    /// Run optimization with an objective.
    ///
    /// Accepts any [`Objective`] implementation, including plain closures
    /// (`Fn(&mut Trial) -> Result<f64, E>`). Runs up to `n_trials`
    /// evaluations sequentially; hooks on the objective may stop earlier.
    ///
    /// A trial whose objective returns an error is stored as
    /// [`Failed`](TrialState::Failed). Unless the study was built with
    /// [`catch_failures(true)`](super::StudyBuilder::catch_failures) the
    /// error is then returned as [`TrialFailed`](Error::TrialFailed).
    ///
    /// # Errors
    ///
    /// - [`TrialFailed`](Error::TrialFailed) when the objective fails and
    ///   failures are not caught.
    /// - [`NoCompletedTrials`](Error::NoCompletedTrials) if trials were
    ///   requested but the study still has no completed trial afterwards.
    /// - Any storage error.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtune::prelude::*;
    ///
    /// let study = Study::builder()
    ///     .minimize()
    ///     .sampler(RandomSampler::with_seed(42))
    ///     .create()
    ///     .unwrap();
    /// let x = FloatParam::new("x", -10.0, 10.0);
    ///
    /// study
    ///     .optimize(10, |trial: &mut Trial| {
    ///         let v = x.suggest(trial)?;
    ///         Ok::<_, Error>(v * v)
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(study.n_trials().unwrap(), 10);
    /// assert!(study.best_value().unwrap() >= 0.0);
    /// ```
    #[allow(clippy::needless_pass_by_value)]
    pub fn optimize(&self, n_trials: usize, objective: impl Objective) -> Result<()> {
        let _span = tracing::info_span!(
            "optimize",
            study = %self.name,
            n_trials,
            direction = %self.direction
        )
        .entered();

        for _ in 0..n_trials {
            if let ControlFlow::Break(()) = objective.before_trial(self) {
                break;
            }

            let mut trial = self.create_trial()?;
            let number = trial.number();
            match objective.evaluate(&mut trial) {
                Ok(value) => {
                    let previous_best = self.best_value().ok();
                    let record = self.complete_trial(trial, value)?;
                    tracing::info!(number, value, "trial completed");
                    let improved = previous_best
                        .is_none_or(|best| self.direction.is_better(value, best));
                    if improved {
                        tracing::info!(number, value, params = ?record.params, "new best value found");
                    }

                    if let ControlFlow::Break(()) = objective.after_trial(self, &record) {
                        return Ok(());
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    self.fail_trial(trial, &message)?;
                    tracing::warn!(number, error = %message, "trial failed");
                    if !self.catch_failures {
                        return Err(Error::TrialFailed { number, message });
                    }
                }
            }
        }

        let has_complete = self
            .history
            .read()
            .iter()
            .any(|t| t.state == TrialState::Complete);
        if n_trials > 0 && !has_complete {
            return Err(Error::NoCompletedTrials);
        }

        Ok(())
    }
}
