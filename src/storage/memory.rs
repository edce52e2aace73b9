use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use super::{Storage, StudyRecord};
use crate::error::{Error, Result};
use crate::trial::TrialRecord;
use crate::types::Direction;

/// Studies and trials as plain collections.
///
/// Shared by [`MemoryStorage`] and the journal replay.
#[derive(Clone, Debug, Default)]
pub(crate) struct StudyTables {
    studies: Vec<StudyRecord>,
    trials: BTreeMap<u64, Vec<TrialRecord>>,
    next_trial_id: u64,
}

impl StudyTables {
    pub(crate) fn find_study(&self, name: &str) -> Option<&StudyRecord> {
        self.studies.iter().find(|s| s.name == name)
    }

    pub(crate) fn studies(&self) -> Vec<StudyRecord> {
        self.studies.clone()
    }

    pub(crate) fn trials(&self, study_id: u64) -> Vec<TrialRecord> {
        self.trials.get(&study_id).cloned().unwrap_or_default()
    }

    pub(crate) fn create_study(&mut self, name: &str, direction: Direction) -> Result<StudyRecord> {
        if self.find_study(name).is_some() {
            return Err(Error::DuplicatedStudy(name.to_owned()));
        }
        let id = self.studies.iter().map(|s| s.id + 1).max().unwrap_or(0);
        let study = StudyRecord {
            id,
            name: name.to_owned(),
            direction,
            datetime_create: Utc::now(),
        };
        self.insert_study(study.clone());
        Ok(study)
    }

    pub(crate) fn insert_study(&mut self, study: StudyRecord) {
        self.trials.entry(study.id).or_default();
        self.studies.push(study);
    }

    pub(crate) fn reserve_trial(&mut self, study_id: u64) -> Result<TrialRecord> {
        let trials = self
            .trials
            .get(&study_id)
            .ok_or_else(|| Error::StudyNotFound(format!("#{study_id}")))?;
        let number = trials.len() as u64;
        let record = TrialRecord::running(self.next_trial_id, number);
        self.upsert_trial(study_id, record.clone());
        Ok(record)
    }

    /// Insert a trial or replace the one with the same id.
    pub(crate) fn upsert_trial(&mut self, study_id: u64, trial: TrialRecord) {
        self.next_trial_id = self.next_trial_id.max(trial.id + 1);
        let trials = self.trials.entry(study_id).or_default();
        match trials.iter_mut().find(|t| t.id == trial.id) {
            Some(slot) => *slot = trial,
            None => trials.push(trial),
        }
    }

    pub(crate) fn finish_trial(&mut self, study_id: u64, trial: &TrialRecord) -> Result<()> {
        let known = self
            .trials
            .get(&study_id)
            .is_some_and(|ts| ts.iter().any(|t| t.id == trial.id));
        if !known {
            return Err(Error::Storage(format!(
                "trial {} was not reserved in study #{study_id}",
                trial.id
            )));
        }
        self.upsert_trial(study_id, trial.clone());
        Ok(())
    }
}

/// In-memory storage.
///
/// Fast and thread-safe, but private to one process: worker processes
/// cannot share it.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<StudyTables>,
}

impl MemoryStorage {
    /// Creates a new, empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn create_study(&self, name: &str, direction: Direction) -> Result<StudyRecord> {
        self.tables.write().create_study(name, direction)
    }

    fn find_study(&self, name: &str) -> Result<Option<StudyRecord>> {
        Ok(self.tables.read().find_study(name).cloned())
    }

    fn studies(&self) -> Result<Vec<StudyRecord>> {
        Ok(self.tables.read().studies())
    }

    fn reserve_trial(&self, study_id: u64) -> Result<TrialRecord> {
        self.tables.write().reserve_trial(study_id)
    }

    fn finish_trial(&self, study_id: u64, trial: &TrialRecord) -> Result<()> {
        self.tables.write().finish_trial(study_id, trial)
    }

    fn trials(&self, study_id: u64) -> Result<Vec<TrialRecord>> {
        Ok(self.tables.read().trials(study_id))
    }
}
