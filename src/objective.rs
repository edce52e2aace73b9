//! The [`Objective`] trait defines what gets optimized.
//!
//! For simple closures, pass them directly to
//! [`Study::optimize`](crate::Study::optimize):
//!
//! ```
//! use paramtune::prelude::*;
//!
//! let study = Study::builder().minimize().create().unwrap();
//! let x = FloatParam::new("x", -10.0, 10.0);
//!
//! study
//!     .optimize(20, |trial: &mut Trial| {
//!         let v = x.suggest(trial)?;
//!         Ok::<_, Error>((v - 3.0).powi(2))
//!     })
//!     .unwrap();
//! ```
//!
//! For early stopping, implement [`Objective`] on a struct:
//!
//! ```
//! use std::ops::ControlFlow;
//!
//! use paramtune::prelude::*;
//! use paramtune::{Objective, TrialRecord};
//!
//! struct StopAtTarget {
//!     x: FloatParam,
//!     target: f64,
//! }
//!
//! impl Objective for StopAtTarget {
//!     type Error = Error;
//!
//!     fn evaluate(&self, trial: &mut Trial) -> Result<f64> {
//!         let v = self.x.suggest(trial)?;
//!         Ok((v - 3.0).powi(2))
//!     }
//!
//!     fn after_trial(&self, _study: &Study, trial: &TrialRecord) -> ControlFlow<()> {
//!         match trial.value {
//!             Some(v) if v < self.target => ControlFlow::Break(()),
//!             _ => ControlFlow::Continue(()),
//!         }
//!     }
//! }
//!
//! let study = Study::builder().minimize().create().unwrap();
//! let obj = StopAtTarget {
//!     x: FloatParam::new("x", -10.0, 10.0),
//!     target: 4.0,
//! };
//! study.optimize(500, obj).unwrap();
//! assert!(study.best_value().unwrap() < 4.0);
//! ```

use core::ops::ControlFlow;

use crate::study::Study;
use crate::trial::{Trial, TrialRecord};

/// Defines an objective function with lifecycle hooks for optimization.
///
/// The only required method is [`evaluate`](Objective::evaluate). The
/// hooks [`before_trial`](Objective::before_trial) and
/// [`after_trial`](Objective::after_trial) allow early stopping.
pub trait Objective {
    /// The error type returned by [`evaluate`](Objective::evaluate).
    type Error: ToString + 'static;

    /// Evaluate the objective for a single trial.
    ///
    /// Sample parameters from `trial` and return the objective value.
    ///
    /// # Errors
    ///
    /// Any error whose type implements `ToString`. The trial is stored as
    /// [`Failed`](crate::TrialState::Failed).
    fn evaluate(&self, trial: &mut Trial) -> Result<f64, Self::Error>;

    /// Called before each trial is created.
    ///
    /// Return `ControlFlow::Break(())` to stop before the next trial starts.
    fn before_trial(&self, _study: &Study) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }

    /// Called after each **completed** trial has been stored.
    ///
    /// Return `ControlFlow::Break(())` to stop the optimization loop.
    fn after_trial(&self, _study: &Study, _trial: &TrialRecord) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F, E> Objective for F
where
    F: Fn(&mut Trial) -> Result<f64, E>,
    E: ToString + 'static,
{
    type Error = E;

    fn evaluate(&self, trial: &mut Trial) -> Result<f64, E> {
        self(trial)
    }
}
