//! JSONL operation-log storage backend.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::memory::StudyTables;
use super::{Storage, StudyRecord};
use crate::error::{Error, Result};
use crate::trial::TrialRecord;
use crate::types::Direction;

/// One line of the journal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalOp {
    CreateStudy { study: StudyRecord },
    ReserveTrial { study_id: u64, trial: TrialRecord },
    FinishTrial { study_id: u64, trial: TrialRecord },
}

impl JournalOp {
    fn apply(self, tables: &mut StudyTables) {
        match self {
            JournalOp::CreateStudy { study } => tables.insert_study(study),
            JournalOp::ReserveTrial { study_id, trial }
            | JournalOp::FinishTrial { study_id, trial } => tables.upsert_trial(study_id, trial),
        }
    }
}

/// A storage backend that appends every operation as a JSON line.
///
/// The file is the single source of truth: every call replays it under a
/// file lock, so any number of processes can share one journal. Writers
/// take an exclusive lock for the whole read-modify-append cycle, readers a
/// shared one.
///
/// # Examples
///
/// ```no_run
/// use paramtune::storage::JournalStorage;
///
/// let storage = JournalStorage::new("opt_study.jsonl");
/// ```
pub struct JournalStorage {
    path: PathBuf,
    /// Serialise in-process writers so the file lock is held briefly.
    write_lock: Mutex<()>,
}

impl JournalStorage {
    /// Creates a journal storage backed by `path`.
    ///
    /// The file is created on the first write.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay the journal under a shared lock.
    fn snapshot(&self) -> Result<StudyTables> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StudyTables::default());
            }
            Err(e) => return Err(Error::file(&self.path)(e)),
        };

        file.lock_shared().map_err(Error::file(&self.path))?;
        let tables = replay(&file, &self.path);
        file.unlock().map_err(Error::file(&self.path))?;
        tables
    }

    /// Run `f` against the replayed state while holding the exclusive lock,
    /// then append the operation it returns.
    fn transact<T>(&self, f: impl FnOnce(&mut StudyTables) -> Result<(T, JournalOp)>) -> Result<T> {
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(Error::file(parent))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(Error::file(&self.path))?;

        file.lock_exclusive().map_err(Error::file(&self.path))?;

        let result = (|| -> Result<T> {
            file.seek(SeekFrom::Start(0))?;
            let mut tables = replay(&file, &self.path)?;
            let (value, op) = f(&mut tables)?;
            repair_tail(&mut file, &self.path)?;

            let line = serde_json::to_string(&op)?;
            writeln!(file, "{line}").map_err(Error::file(&self.path))?;
            file.flush().map_err(Error::file(&self.path))?;
            Ok(value)
        })();

        file.unlock().map_err(Error::file(&self.path))?;
        result
    }
}

impl Storage for JournalStorage {
    fn create_study(&self, name: &str, direction: Direction) -> Result<StudyRecord> {
        self.transact(|tables| {
            let study = tables.create_study(name, direction)?;
            Ok((study.clone(), JournalOp::CreateStudy { study }))
        })
    }

    fn find_study(&self, name: &str) -> Result<Option<StudyRecord>> {
        Ok(self.snapshot()?.find_study(name).cloned())
    }

    fn studies(&self) -> Result<Vec<StudyRecord>> {
        Ok(self.snapshot()?.studies())
    }

    fn reserve_trial(&self, study_id: u64) -> Result<TrialRecord> {
        self.transact(|tables| {
            let trial = tables.reserve_trial(study_id)?;
            Ok((
                trial.clone(),
                JournalOp::ReserveTrial {
                    study_id,
                    trial,
                },
            ))
        })
    }

    fn finish_trial(&self, study_id: u64, trial: &TrialRecord) -> Result<()> {
        self.transact(|tables| {
            tables.finish_trial(study_id, trial)?;
            Ok((
                (),
                JournalOp::FinishTrial {
                    study_id,
                    trial: trial.clone(),
                },
            ))
        })
    }

    fn trials(&self, study_id: u64) -> Result<Vec<TrialRecord>> {
        Ok(self.snapshot()?.trials(study_id))
    }
}

/// Make sure the next append starts on a fresh line.
///
/// A final line without its newline is either a complete operation (the
/// newline is added) or a torn one (it is cut off). Both cases match what
/// [`replay`] made of it.
fn repair_tail(file: &mut File, path: &Path) -> Result<()> {
    let len = file.metadata().map_err(Error::file(path))?.len();
    if len == 0 {
        return Ok(());
    }

    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0)).map_err(Error::file(path))?;
    file.read_to_end(&mut bytes).map_err(Error::file(path))?;
    if bytes.last() == Some(&b'\n') {
        return Ok(());
    }

    let start = bytes.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    let tail = String::from_utf8_lossy(&bytes[start..]);
    if tail.trim().is_empty() || serde_json::from_str::<JournalOp>(tail.trim()).is_ok() {
        writeln!(file).map_err(Error::file(path))?;
    } else {
        tracing::warn!(path = %path.display(), "truncating torn journal tail");
        file.set_len(start as u64).map_err(Error::file(path))?;
    }
    Ok(())
}

/// Rebuild the tables from every line of `file`.
///
/// A torn final line (a writer crashed mid-append) is skipped.
fn replay(file: &File, path: &Path) -> Result<StudyTables> {
    let mut tables = StudyTables::default();
    let mut lines = BufReader::new(file).lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.map_err(Error::file(path))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<JournalOp>(line) {
            Ok(op) => op.apply(&mut tables),
            Err(e) if lines.peek().is_none() => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring torn journal tail");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(tables)
}
