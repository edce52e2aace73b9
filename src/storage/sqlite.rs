//! `SQLite`-backed storage for multi-process studies.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use super::{Storage, StudyRecord};
use crate::distribution::Distribution;
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::trial::{AttrValue, TrialRecord};
use crate::types::{Direction, TrialState};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS studies (
    study_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    study_name      TEXT NOT NULL UNIQUE,
    direction       TEXT NOT NULL,
    datetime_create TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS trials (
    trial_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    number            INTEGER NOT NULL,
    study_id          INTEGER NOT NULL REFERENCES studies (study_id),
    state             TEXT NOT NULL,
    value             REAL,
    datetime_start    TEXT,
    datetime_complete TEXT,
    UNIQUE (study_id, number)
);
CREATE TABLE IF NOT EXISTS trial_params (
    trial_id          INTEGER NOT NULL REFERENCES trials (trial_id),
    param_name        TEXT NOT NULL,
    param_value       REAL NOT NULL,
    distribution_json TEXT NOT NULL,
    PRIMARY KEY (trial_id, param_name)
);
CREATE TABLE IF NOT EXISTS trial_user_attrs (
    trial_id   INTEGER NOT NULL REFERENCES trials (trial_id),
    key        TEXT NOT NULL,
    value_json TEXT NOT NULL,
    PRIMARY KEY (trial_id, key)
);
";

/// A storage backend that persists studies in a `SQLite` database.
///
/// WAL mode gives concurrent readers and a single writer; trial reservation
/// runs in an `IMMEDIATE` transaction so concurrent processes never hand out
/// the same trial number. A busy timeout makes writers wait instead of
/// failing while another process holds the lock.
///
/// The tables (`studies`, `trials`, `trial_params`,
/// `trial_user_attrs`) are plain relational rows, so the database can
/// be inspected with any `SQLite` client.
///
/// Parameter values share one `REAL` column: integer parameters are exact
/// up to 2^53 in magnitude and are rounded back to integers on read.
///
/// # Examples
///
/// ```no_run
/// use paramtune::storage::SqliteStorage;
///
/// let storage = SqliteStorage::open("opt_study.db").unwrap();
/// ```
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// How long a writer waits for another process's lock.
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(60);

    /// Opens (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns a [`Storage`](crate::Error::Storage) error if the database
    /// cannot be opened or the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(Error::file(parent))?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens a private in-memory database, mostly useful in tests.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Self::BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl Storage for SqliteStorage {
    fn create_study(&self, name: &str, direction: Direction) -> Result<StudyRecord> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let exists: Option<i64> = tx
            .query_row(
                "SELECT study_id FROM studies WHERE study_name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(Error::DuplicatedStudy(name.to_owned()));
        }

        let created = Utc::now();
        tx.execute(
            "INSERT INTO studies (study_name, direction, datetime_create) VALUES (?1, ?2, ?3)",
            params![name, direction.as_str(), created.to_rfc3339()],
        )?;
        let id = to_u64(tx.last_insert_rowid())?;
        tx.commit()?;

        Ok(StudyRecord {
            id,
            name: name.to_owned(),
            direction,
            datetime_create: created,
        })
    }

    fn find_study(&self, name: &str) -> Result<Option<StudyRecord>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT study_id, study_name, direction, datetime_create
             FROM studies WHERE study_name = ?1",
            [name],
            study_from_row,
        )
        .optional()?
        .transpose()
    }

    fn studies(&self) -> Result<Vec<StudyRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT study_id, study_name, direction, datetime_create
             FROM studies ORDER BY study_id",
        )?;
        let rows = stmt.query_map([], study_from_row)?;
        rows.map(|row| row?).collect()
    }

    fn reserve_trial(&self, study_id: u64) -> Result<TrialRecord> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let sid = to_i64(study_id)?;

        let known: Option<i64> = tx
            .query_row(
                "SELECT study_id FROM studies WHERE study_id = ?1",
                [sid],
                |row| row.get(0),
            )
            .optional()?;
        if known.is_none() {
            return Err(Error::StudyNotFound(format!("#{study_id}")));
        }

        let number: i64 = tx.query_row(
            "SELECT COUNT(*) FROM trials WHERE study_id = ?1",
            [sid],
            |row| row.get(0),
        )?;
        let start = Utc::now();
        tx.execute(
            "INSERT INTO trials (number, study_id, state, datetime_start)
             VALUES (?1, ?2, ?3, ?4)",
            params![number, sid, TrialState::Running.as_str(), start.to_rfc3339()],
        )?;
        let id = to_u64(tx.last_insert_rowid())?;
        tx.commit()?;

        let mut record = TrialRecord::running(id, to_u64(number)?);
        record.datetime_start = Some(start);
        Ok(record)
    }

    fn finish_trial(&self, study_id: u64, trial: &TrialRecord) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tid = to_i64(trial.id)?;

        let updated = tx.execute(
            "UPDATE trials SET state = ?1, value = ?2, datetime_complete = ?3
             WHERE trial_id = ?4 AND study_id = ?5",
            params![
                trial.state.as_str(),
                trial.value,
                trial.datetime_complete.map(|t| t.to_rfc3339()),
                tid,
                to_i64(study_id)?,
            ],
        )?;
        if updated != 1 {
            return Err(Error::Storage(format!(
                "trial {} was not reserved in study #{study_id}",
                trial.id
            )));
        }

        tx.execute("DELETE FROM trial_params WHERE trial_id = ?1", [tid])?;
        for (name, value) in &trial.params {
            let Some(distribution) = trial.distributions.get(name) else {
                continue;
            };
            tx.execute(
                "INSERT INTO trial_params (trial_id, param_name, param_value, distribution_json)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    tid,
                    name,
                    value.as_f64(),
                    serde_json::to_string(distribution)?
                ],
            )?;
        }

        tx.execute("DELETE FROM trial_user_attrs WHERE trial_id = ?1", [tid])?;
        for (key, value) in &trial.user_attrs {
            tx.execute(
                "INSERT INTO trial_user_attrs (trial_id, key, value_json) VALUES (?1, ?2, ?3)",
                params![tid, key, serde_json::to_string(value)?],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn trials(&self, study_id: u64) -> Result<Vec<TrialRecord>> {
        let conn = self.conn.lock();
        let sid = to_i64(study_id)?;

        let mut stmt = conn.prepare(
            "SELECT trial_id, number, state, value, datetime_start, datetime_complete
             FROM trials WHERE study_id = ?1 ORDER BY number",
        )?;
        let rows = stmt.query_map([sid], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut trials = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();
        for row in rows {
            let (id, number, state, value, start, complete) = row?;
            let state: TrialState = state.parse().map_err(Error::Storage)?;
            index.insert(id, trials.len());
            trials.push(TrialRecord {
                id: to_u64(id)?,
                number: to_u64(number)?,
                state,
                value,
                params: std::collections::BTreeMap::new(),
                distributions: std::collections::BTreeMap::new(),
                user_attrs: std::collections::BTreeMap::new(),
                datetime_start: start.as_deref().map(parse_time).transpose()?,
                datetime_complete: complete.as_deref().map(parse_time).transpose()?,
            });
        }

        let mut stmt = conn.prepare(
            "SELECT p.trial_id, p.param_name, p.param_value, p.distribution_json
             FROM trial_params p JOIN trials t ON t.trial_id = p.trial_id
             WHERE t.study_id = ?1",
        )?;
        let rows = stmt.query_map([sid], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        for row in rows {
            let (id, name, raw, distribution) = row?;
            let Some(&i) = index.get(&id) else { continue };
            let distribution: Distribution = serde_json::from_str(&distribution)?;
            let value = param_from_f64(raw, &distribution);
            trials[i].params.insert(name.clone(), value);
            trials[i].distributions.insert(name, distribution);
        }

        let mut stmt = conn.prepare(
            "SELECT a.trial_id, a.key, a.value_json
             FROM trial_user_attrs a JOIN trials t ON t.trial_id = a.trial_id
             WHERE t.study_id = ?1",
        )?;
        let rows = stmt.query_map([sid], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (id, key, value) = row?;
            let Some(&i) = index.get(&id) else { continue };
            let value: AttrValue = serde_json::from_str(&value)?;
            trials[i].user_attrs.insert(key, value);
        }

        Ok(trials)
    }
}

fn study_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<StudyRecord>> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let direction: String = row.get(2)?;
    let created: String = row.get(3)?;
    Ok((|| -> Result<StudyRecord> {
        Ok(StudyRecord {
            id: to_u64(id)?,
            name,
            direction: direction.parse().map_err(Error::Storage)?,
            datetime_create: parse_time(&created)?,
        })
    })())
}

#[allow(clippy::cast_possible_truncation)]
fn param_from_f64(raw: f64, distribution: &Distribution) -> ParamValue {
    match distribution {
        Distribution::Float(_) => ParamValue::Float(raw),
        Distribution::Int(_) => ParamValue::Int(raw.round() as i64),
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

fn to_u64(v: i64) -> Result<u64> {
    u64::try_from(v).map_err(|_| Error::Storage(format!("negative row id {v}")))
}

fn to_i64(v: u64) -> Result<i64> {
    i64::try_from(v).map_err(|_| Error::Storage(format!("row id {v} out of range")))
}
