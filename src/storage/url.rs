use core::fmt;
use core::str::FromStr;
use std::path::PathBuf;
use std::sync::Arc;

use super::{JournalStorage, MemoryStorage, SqliteStorage, Storage};
use crate::error::{Error, Result};

/// A storage location written as `scheme:///path`.
///
/// ```
/// use paramtune::storage::StorageUrl;
///
/// assert_eq!(
///     "journal:///tmp/study.jsonl".parse::<StorageUrl>().unwrap(),
///     StorageUrl::Journal("tmp/study.jsonl".into())
/// );
/// assert_eq!("memory".parse::<StorageUrl>().unwrap(), StorageUrl::Memory);
/// assert!("postgres://db".parse::<StorageUrl>().is_err());
/// ```
///
/// As with `SQLAlchemy` URLs, the three slashes separate an empty host from
/// the path: `sqlite:///./opt_study.db` is relative, `sqlite:////tmp/x.db`
/// absolute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageUrl {
    /// `sqlite:///<path>`
    Sqlite(PathBuf),
    /// `journal:///<path>`
    Journal(PathBuf),
    /// `memory`
    Memory,
}

impl StorageUrl {
    /// Opens the backend this URL names.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the `SQLite` database cannot be opened.
    pub fn open(&self) -> Result<Arc<dyn Storage>> {
        Ok(match self {
            StorageUrl::Sqlite(path) => Arc::new(SqliteStorage::open(path)?),
            StorageUrl::Journal(path) => Arc::new(JournalStorage::new(path)),
            StorageUrl::Memory => Arc::new(MemoryStorage::new()),
        })
    }

    /// Returns `true` when several processes can share the backend.
    #[must_use]
    pub fn is_shared(&self) -> bool {
        !matches!(self, StorageUrl::Memory)
    }
}

/// Parses `url` and opens the backend it names.
///
/// ```
/// use paramtune::storage::{Storage, open_storage};
///
/// let storage = open_storage("memory").unwrap();
/// assert!(storage.studies().unwrap().is_empty());
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidStorageUrl`] for an unknown scheme, or a storage
/// error if the backend cannot be opened.
pub fn open_storage(url: &str) -> Result<Arc<dyn Storage>> {
    url.parse::<StorageUrl>()?.open()
}

impl FromStr for StorageUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidStorageUrl(s.to_owned());
        if s == "memory" {
            return Ok(StorageUrl::Memory);
        }
        let (scheme, path) = s.split_once(":///").ok_or_else(invalid)?;
        if path.is_empty() {
            return Err(invalid());
        }
        match scheme {
            "sqlite" => Ok(StorageUrl::Sqlite(PathBuf::from(path))),
            "journal" => Ok(StorageUrl::Journal(PathBuf::from(path))),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for StorageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageUrl::Sqlite(path) => write!(f, "sqlite:///{}", path.display()),
            StorageUrl::Journal(path) => write!(f, "journal:///{}", path.display()),
            StorageUrl::Memory => f.write_str("memory"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_paths_keep_their_slash() {
        let url: StorageUrl = "sqlite:////var/lib/study.db".parse().unwrap();
        assert_eq!(url, StorageUrl::Sqlite("/var/lib/study.db".into()));
        assert_eq!(url.to_string(), "sqlite:////var/lib/study.db");
    }

    #[test]
    fn empty_paths_are_rejected() {
        assert!(matches!(
            "sqlite:///".parse::<StorageUrl>(),
            Err(Error::InvalidStorageUrl(_))
        ));
    }

    #[test]
    fn only_memory_is_private() {
        assert!(!StorageUrl::Memory.is_shared());
        assert!(StorageUrl::Journal("j".into()).is_shared());
    }
}
