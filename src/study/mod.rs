//! Study implementation for managing optimization trials.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::sampler::Sampler;
use crate::storage::{Storage, StudyRecord};
use crate::trial::{Trial, TrialRecord};
use crate::types::{Direction, TrialState};

mod analysis;
mod builder;
mod export;
mod optimize;

pub use builder::StudyBuilder;

/// A study manages the optimization process, tracking trials and their
/// results in a [`Storage`] backend.
///
/// A study is identified by its name inside the storage. Any number of
/// `Study` handles, in this process or others, may point at the same
/// stored study; each one refreshes its view of the trials from storage
/// before sampling a new trial.
///
/// # Examples
///
/// ```
/// use paramtune::{Direction, Study};
///
/// let study = Study::builder().name("demo").maximize().create().unwrap();
/// assert_eq!(study.name(), "demo");
/// assert_eq!(study.direction(), Direction::Maximize);
/// ```
pub struct Study {
    pub(crate) name: String,
    pub(crate) study_id: u64,
    pub(crate) direction: Direction,
    pub(crate) sampler: Arc<dyn Sampler>,
    pub(crate) storage: Arc<dyn Storage>,
    /// Last snapshot of the stored trials, shared with live trials.
    pub(crate) history: Arc<RwLock<Vec<TrialRecord>>>,
    /// Queue of parameter configurations to evaluate next.
    pub(crate) enqueued_params: Mutex<VecDeque<BTreeMap<String, ParamValue>>>,
    pub(crate) catch_failures: bool,
}

impl core::fmt::Debug for Study {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Study")
            .field("name", &self.name)
            .field("study_id", &self.study_id)
            .field("direction", &self.direction)
            .field("catch_failures", &self.catch_failures)
            .finish_non_exhaustive()
    }
}

impl Study {
    /// Return a [`StudyBuilder`] for creating or loading a study.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtune::prelude::*;
    ///
    /// let study = Study::builder()
    ///     .name("tuning")
    ///     .maximize()
    ///     .sampler(TpeSampler::new())
    ///     .create()
    ///     .unwrap();
    /// assert_eq!(study.direction(), Direction::Maximize);
    /// ```
    #[must_use]
    pub fn builder() -> StudyBuilder {
        StudyBuilder::new()
    }

    /// Load an existing study from `storage`.
    ///
    /// The direction is the one recorded when the study was created.
    ///
    /// # Errors
    ///
    /// Returns [`StudyNotFound`](Error::StudyNotFound) if no study with
    /// that name exists, or a storage error.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use paramtune::prelude::*;
    /// use paramtune::storage::{MemoryStorage, Storage};
    ///
    /// let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    /// Study::builder()
    ///     .name("shared")
    ///     .maximize()
    ///     .storage(Arc::clone(&storage))
    ///     .create()
    ///     .unwrap();
    ///
    /// let loaded = Study::load("shared", storage, RandomSampler::new()).unwrap();
    /// assert_eq!(loaded.direction(), Direction::Maximize);
    /// ```
    pub fn load(
        name: &str,
        storage: Arc<dyn Storage>,
        sampler: impl Sampler + 'static,
    ) -> Result<Self> {
        let record = storage
            .find_study(name)?
            .ok_or_else(|| Error::StudyNotFound(name.to_owned()))?;
        Self::from_record(record, Arc::new(sampler), storage, false)
    }

    pub(crate) fn from_record(
        record: StudyRecord,
        sampler: Arc<dyn Sampler>,
        storage: Arc<dyn Storage>,
        catch_failures: bool,
    ) -> Result<Self> {
        let history = storage.trials(record.id)?;
        Ok(Self {
            name: record.name,
            study_id: record.id,
            direction: record.direction,
            sampler,
            storage,
            history: Arc::new(RwLock::new(history)),
            enqueued_params: Mutex::new(VecDeque::new()),
            catch_failures,
        })
    }

    /// Return the study name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the storage-assigned study id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.study_id
    }

    /// Return the optimization direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Return the storage backend this study writes to.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Enqueue a parameter configuration to evaluate on a future trial.
    ///
    /// Enqueued configurations are consumed first-in, first-out by
    /// [`create_trial`](Self::create_trial). Parameters missing from the
    /// map are sampled normally.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    ///
    /// use paramtune::prelude::*;
    ///
    /// let study = Study::builder().create().unwrap();
    /// study.enqueue(BTreeMap::from([("x".to_owned(), ParamValue::Float(0.5))]));
    ///
    /// let mut trial = study.ask().unwrap();
    /// let x = FloatParam::new("x", 0.0, 1.0).suggest(&mut trial).unwrap();
    /// assert_eq!(x, 0.5);
    /// ```
    pub fn enqueue(&self, params: BTreeMap<String, ParamValue>) {
        self.enqueued_params.lock().push_back(params);
    }

    /// Return the number of enqueued configurations not yet consumed.
    #[must_use]
    pub fn n_enqueued(&self) -> usize {
        self.enqueued_params.lock().len()
    }

    /// Reload the trial history from storage.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trials cannot be read.
    pub fn refresh(&self) -> Result<()> {
        let trials = self.storage.trials(self.study_id)?;
        *self.history.write() = trials;
        Ok(())
    }

    /// Reserve a new trial in storage and return it ready for sampling.
    ///
    /// The history the sampler sees is refreshed first, so trials finished
    /// by other processes inform this one.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the history cannot be read or the trial
    /// cannot be reserved.
    pub fn create_trial(&self) -> Result<Trial> {
        self.refresh()?;
        let record = self.storage.reserve_trial(self.study_id)?;
        let mut trial = Trial::with_sampler(
            &record,
            self.direction,
            Arc::clone(&self.sampler),
            Arc::clone(&self.history),
        );
        if let Some(fixed) = self.enqueued_params.lock().pop_front() {
            trial.set_fixed_params(fixed);
        }
        tracing::debug!(study = %self.name, number = record.number, "trial reserved");
        Ok(trial)
    }

    /// Alias of [`create_trial`](Self::create_trial) for the ask-and-tell
    /// interface.
    ///
    /// # Errors
    ///
    /// See [`create_trial`](Self::create_trial).
    pub fn ask(&self) -> Result<Trial> {
        self.create_trial()
    }

    /// Record the outcome of a trial obtained from [`ask`](Self::ask).
    ///
    /// `Ok(value)` completes the trial, `Err(e)` stores it as failed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trial cannot be persisted.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtune::prelude::*;
    ///
    /// let study = Study::builder().create().unwrap();
    /// let trial = study.ask().unwrap();
    /// study.tell(trial, Ok::<_, String>(1.5)).unwrap();
    /// let trial = study.ask().unwrap();
    /// study.tell(trial, Err::<f64, _>("boom")).unwrap();
    ///
    /// assert_eq!(study.n_trials().unwrap(), 2);
    /// assert_eq!(study.best_value().unwrap(), 1.5);
    /// ```
    pub fn tell(
        &self,
        trial: Trial,
        value: core::result::Result<f64, impl ToString>,
    ) -> Result<TrialRecord> {
        match value {
            Ok(v) => self.complete_trial(trial, v),
            Err(e) => self.fail_trial(trial, e),
        }
    }

    /// Store `trial` as complete with the given objective value.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trial cannot be persisted.
    pub fn complete_trial(&self, trial: Trial, value: f64) -> Result<TrialRecord> {
        let record = trial.into_record(Some(value), TrialState::Complete);
        self.finish(record)
    }

    /// Store `trial` as failed.
    ///
    /// The error message is kept as the `fail_reason` user attribute.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trial cannot be persisted.
    pub fn fail_trial(&self, mut trial: Trial, error: impl ToString) -> Result<TrialRecord> {
        trial.set_user_attr("fail_reason", error.to_string());
        let record = trial.into_record(None, TrialState::Failed);
        self.finish(record)
    }

    fn finish(&self, record: TrialRecord) -> Result<TrialRecord> {
        self.storage.finish_trial(self.study_id, &record)?;
        let mut history = self.history.write();
        match history.iter_mut().find(|t| t.id == record.id) {
            Some(slot) => *slot = record.clone(),
            None => history.push(record.clone()),
        }
        Ok(record)
    }
}
