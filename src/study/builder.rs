use std::sync::Arc;

use crate::error::{Error, Result};
use crate::sampler::{Sampler, TpeSampler};
use crate::storage::{MemoryStorage, Storage, StudyRecord};
use crate::types::Direction;

use super::Study;

/// A builder for creating or loading [`Study`] instances.
///
/// Created via [`Study::builder()`].
///
/// # Defaults
///
/// - Name: generated from the creation time
/// - Direction: [`Minimize`](Direction::Minimize)
/// - Sampler: [`TpeSampler`]
/// - Storage: [`MemoryStorage`]
/// - `load_if_exists`: `false`
/// - `catch_failures`: `false`
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
/// let first = Study::builder()
///     .name("opt_study")
///     .maximize()
///     .storage(Arc::clone(&storage))
///     .load_if_exists(true)
///     .create()
///     .unwrap();
/// let second = Study::builder()
///     .name("opt_study")
///     .maximize()
///     .storage(storage)
///     .load_if_exists(true)
///     .create()
///     .unwrap();
///
/// assert_eq!(first.id(), second.id());
/// ```
pub struct StudyBuilder {
    name: Option<String>,
    direction: Direction,
    sampler: Option<Arc<dyn Sampler>>,
    storage: Option<Arc<dyn Storage>>,
    load_if_exists: bool,
    catch_failures: bool,
}

impl StudyBuilder {
    pub(super) fn new() -> Self {
        Self {
            name: None,
            direction: Direction::Minimize,
            sampler: None,
            storage: None,
            load_if_exists: false,
            catch_failures: false,
        }
    }

    /// Set the study name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the optimization direction to minimize (the default).
    #[must_use]
    pub fn minimize(mut self) -> Self {
        self.direction = Direction::Minimize;
        self
    }

    /// Set the optimization direction to maximize.
    #[must_use]
    pub fn maximize(mut self) -> Self {
        self.direction = Direction::Maximize;
        self
    }

    /// Set the optimization direction explicitly.
    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the sampler used for parameter suggestions.
    #[must_use]
    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Arc::new(sampler));
        self
    }

    /// Set the sampler from an already boxed trait object.
    #[must_use]
    pub fn boxed_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = Some(Arc::from(sampler));
        self
    }

    /// Set the storage backend.
    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Reuse the stored study when the name already exists.
    #[must_use]
    pub fn load_if_exists(mut self, load_if_exists: bool) -> Self {
        self.load_if_exists = load_if_exists;
        self
    }

    /// Keep optimizing after an objective error instead of returning it.
    ///
    /// Failed trials are stored either way.
    #[must_use]
    pub fn catch_failures(mut self, catch_failures: bool) -> Self {
        self.catch_failures = catch_failures;
        self
    }

    /// Create the study, or load it when `load_if_exists` is set and the
    /// name is taken.
    ///
    /// # Errors
    ///
    /// - [`DuplicatedStudy`](Error::DuplicatedStudy) if the name exists and
    ///   `load_if_exists` is not set.
    /// - [`DirectionMismatch`](Error::DirectionMismatch) if the stored study
    ///   has another direction.
    /// - Any storage error.
    pub fn create(self) -> Result<Study> {
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let sampler = self
            .sampler
            .unwrap_or_else(|| Arc::new(TpeSampler::new()));
        let name = self.name.unwrap_or_else(generated_name);

        let record = if self.load_if_exists {
            match storage.find_study(&name)? {
                Some(existing) => existing,
                // Another process may create the same name between the
                // lookup and the insert.
                None => match storage.create_study(&name, self.direction) {
                    Err(Error::DuplicatedStudy(_)) => storage
                        .find_study(&name)?
                        .ok_or_else(|| Error::StudyNotFound(name.clone()))?,
                    created => log_created(created?),
                },
            }
        } else {
            log_created(storage.create_study(&name, self.direction)?)
        };

        if record.direction != self.direction {
            return Err(Error::DirectionMismatch {
                name,
                stored: record.direction,
                requested: self.direction,
            });
        }

        Study::from_record(record, sampler, storage, self.catch_failures)
    }
}

fn log_created(record: StudyRecord) -> StudyRecord {
    tracing::info!(study = %record.name, direction = %record.direction, "created study");
    record
}

fn generated_name() -> String {
    format!(
        "study-{}-{:04x}",
        chrono::Utc::now().format("%Y%m%d-%H%M%S"),
        fastrand::u16(..)
    )
}
