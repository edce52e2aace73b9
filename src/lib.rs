#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]

//! Drive an external scoring program through a persisted parameter-search
//! study. A JSON template names the parameters to tune; every trial samples
//! them, writes the parameter file, runs the program through the shell and
//! records the integer on its last output line as the trial's value. Any
//! number of worker processes can share one study stored in `SQLite` or a
//! JSONL journal.
//!
//! # Getting Started
//!
//! ```
//! use paramtune::prelude::*;
//!
//! let study = Study::builder().name("quadratic").minimize().create().unwrap();
//! let x = FloatParam::new("x", -10.0, 10.0);
//!
//! study
//!     .optimize(30, |trial: &mut Trial| {
//!         let v = x.suggest(trial)?;
//!         Ok::<_, Error>((v - 3.0).powi(2))
//!     })
//!     .unwrap();
//!
//! let best = study.best_trial().unwrap();
//! println!("x = {}, f(x) = {:?}", best.params["x"], best.value);
//! ```
//!
//! # Tuning an external program
//!
//! ```no_run
//! use paramtune::prelude::*;
//! use paramtune::storage::open_storage;
//!
//! let storage = open_storage("sqlite:///./opt_study.db").unwrap();
//! let study = Study::builder()
//!     .name("opt_study")
//!     .maximize()
//!     .storage(storage)
//!     .load_if_exists(true)
//!     .create()
//!     .unwrap();
//!
//! let objective = TuneObjective::from_template_path(
//!     "./data/params_default.json",
//!     "./data/params.json",
//!     ScoreCommand::new("./target/release/procon31-comp"),
//! )
//! .unwrap();
//! study.optimize(5, objective).unwrap();
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Study`] | Create or load a stored study, run trials, find the best one. |
//! | [`Trial`] | One evaluation, carrying the suggested parameter values. |
//! | [`Parameter`](parameter::Parameter) | A named search dimension: [`FloatParam`](parameter::FloatParam), [`IntParam`](parameter::IntParam). |
//! | [`Sampler`](sampler::Sampler) | Strategy for choosing the next point ([`TpeSampler`](sampler::TpeSampler), [`RandomSampler`](sampler::RandomSampler)). |
//! | [`Storage`](storage::Storage) | Where studies live ([`SqliteStorage`](storage::SqliteStorage), [`JournalStorage`](storage::JournalStorage), [`MemoryStorage`](storage::MemoryStorage)). |
//! | [`ParamTemplate`](template::ParamTemplate) | The parameter file with ranges to tune. |
//! | [`ScoreCommand`](command::ScoreCommand) | The external program and its score line. |
//! | [`WorkerPool`](worker::WorkerPool) | Worker processes sharing one study. |

pub mod command;
pub mod distribution;
mod error;
mod kde;
pub mod objective;
mod param;
pub mod parameter;
mod rng_util;
pub mod sampler;
pub mod storage;
mod study;
pub mod template;
mod trial;
pub mod tuner;
mod types;
pub mod worker;

pub use error::{Error, Result};
pub use objective::Objective;
pub use param::ParamValue;
pub use study::{Study, StudyBuilder};
pub use trial::{AttrValue, Trial, TrialRecord};
pub use types::{Direction, TrialState};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use paramtune::prelude::*;
/// ```
pub mod prelude {
    pub use crate::command::ScoreCommand;
    pub use crate::error::{Error, Result};
    pub use crate::objective::Objective;
    pub use crate::param::ParamValue;
    pub use crate::parameter::{FloatParam, IntParam, Parameter};
    pub use crate::sampler::{RandomSampler, Sampler, TpeSampler};
    pub use crate::storage::{JournalStorage, MemoryStorage, SqliteStorage, Storage};
    pub use crate::study::{Study, StudyBuilder};
    pub use crate::template::ParamTemplate;
    pub use crate::trial::{AttrValue, Trial, TrialRecord};
    pub use crate::tuner::TuneObjective;
    pub use crate::types::{Direction, TrialState};
}
