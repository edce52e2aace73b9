//! Study storage backends.
//!
//! The [`Storage`] trait defines how studies and their trials are persisted.
//! Every [`Study`](crate::Study) holds an `Arc<dyn Storage>`, so one handle
//! can be shared across threads; cross-process sharing is up to the backend.
//!
//! # Available backends
//!
//! | Backend | URL | Multi-process |
//! |---------|-----|---------------|
//! | [`MemoryStorage`] | `memory` | no |
//! | [`SqliteStorage`] | `sqlite:///<path>` | yes (WAL + immediate transactions) |
//! | [`JournalStorage`] | `journal:///<path>` | yes (`fs2` file locks) |
//!
//! ```
//! use paramtune::storage::StorageUrl;
//!
//! let url: StorageUrl = "sqlite:///./opt_study.db".parse().unwrap();
//! assert_eq!(url, StorageUrl::Sqlite("./opt_study.db".into()));
//! ```

mod journal;
mod memory;
mod sqlite;
mod url;

use chrono::{DateTime, Utc};
pub use journal::JournalStorage;
pub use memory::MemoryStorage;
use serde::{Deserialize, Serialize};
pub use sqlite::SqliteStorage;
pub use url::{StorageUrl, open_storage};

use crate::error::Result;
use crate::trial::TrialRecord;
use crate::types::Direction;

/// A study row: its identity and optimization direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    /// Storage-assigned identifier.
    pub id: u64,
    /// Unique study name.
    pub name: String,
    /// Optimization direction fixed at creation.
    pub direction: Direction,
    /// Creation time.
    pub datetime_create: DateTime<Utc>,
}

/// Trait for persisting studies and trials.
///
/// Implementations must be `Send + Sync`. Backends meant for several
/// processes must make [`reserve_trial`](Storage::reserve_trial) atomic
/// across them so every trial gets a distinct id and number.
pub trait Storage: Send + Sync {
    /// Create a new study.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicatedStudy`](crate::Error::DuplicatedStudy) if the
    /// name is taken, or a storage error.
    fn create_study(&self, name: &str, direction: Direction) -> Result<StudyRecord>;

    /// Look up a study by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read.
    fn find_study(&self, name: &str) -> Result<Option<StudyRecord>>;

    /// List every study, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read.
    fn studies(&self) -> Result<Vec<StudyRecord>>;

    /// Allocate a new running trial in `study_id` and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`StudyNotFound`](crate::Error::StudyNotFound) for an unknown
    /// study, or a storage error.
    fn reserve_trial(&self, study_id: u64) -> Result<TrialRecord>;

    /// Persist the final state of a previously reserved trial.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the trial was never reserved or the write
    /// fails.
    fn finish_trial(&self, study_id: u64, trial: &TrialRecord) -> Result<()>;

    /// Return every trial of `study_id`, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read.
    fn trials(&self, study_id: u64) -> Result<Vec<TrialRecord>>;
}
