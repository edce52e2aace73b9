use std::collections::BTreeSet;
use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::trial::TrialRecord;
use crate::types::Direction;

use super::Study;

/// The JSON export document.
#[derive(Serialize)]
struct StudyExport<'a> {
    study_name: &'a str,
    direction: Direction,
    trials: &'a [TrialRecord],
}

impl Study {
    /// Write every trial to `writer` in CSV format.
    ///
    /// Columns: `number`, `state`, `value`, `datetime_start`,
    /// `datetime_complete`, `duration_ms`, then one `params_<name>` column
    /// per parameter and one `user_attrs_<key>` column per attribute key,
    /// both sorted by name. Cells for missing values are empty.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails, or a storage error.
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtune::prelude::*;
    ///
    /// let study = Study::builder().create().unwrap();
    /// let x = FloatParam::new("x", 0.0, 10.0);
    ///
    /// let mut trial = study.ask().unwrap();
    /// x.suggest(&mut trial).unwrap();
    /// study.complete_trial(trial, 0.42).unwrap();
    ///
    /// let mut buf = Vec::new();
    /// study.to_csv(&mut buf).unwrap();
    /// let csv = String::from_utf8(buf).unwrap();
    /// assert!(csv.starts_with("number,state,value"));
    /// assert!(csv.contains("params_x"));
    /// ```
    pub fn to_csv(&self, mut writer: impl Write) -> Result<()> {
        let trials = self.trials()?;

        let param_names: BTreeSet<&str> = trials
            .iter()
            .flat_map(|t| t.params.keys().map(String::as_str))
            .collect();
        let attr_keys: BTreeSet<&str> = trials
            .iter()
            .flat_map(|t| t.user_attrs.keys().map(String::as_str))
            .collect();

        write!(
            writer,
            "number,state,value,datetime_start,datetime_complete,duration_ms"
        )?;
        for name in &param_names {
            write!(writer, ",{}", csv_escape(&format!("params_{name}")))?;
        }
        for key in &attr_keys {
            write!(writer, ",{}", csv_escape(&format!("user_attrs_{key}")))?;
        }
        writeln!(writer)?;

        for trial in &trials {
            write!(writer, "{},{}", trial.number, trial.state)?;
            write!(writer, ",{}", optional(trial.complete_value()))?;
            write!(
                writer,
                ",{},{}",
                optional(trial.datetime_start.map(|t| t.to_rfc3339())),
                optional(trial.datetime_complete.map(|t| t.to_rfc3339()))
            )?;
            write!(
                writer,
                ",{}",
                optional(trial.duration().map(|d| d.num_milliseconds()))
            )?;

            for name in &param_names {
                write!(writer, ",{}", optional(trial.params.get(*name)))?;
            }
            for key in &attr_keys {
                let cell = trial
                    .user_attrs
                    .get(*key)
                    .map(|v| csv_escape(&v.to_string()));
                write!(writer, ",{}", optional(cell))?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Write the study name, direction and every trial as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns a JSON or I/O error if writing fails, or a storage error.
    pub fn to_json(&self, mut writer: impl Write) -> Result<()> {
        let trials = self.trials()?;
        let doc = StudyExport {
            study_name: &self.name,
            direction: self.direction,
            trials: &trials,
        };
        serde_json::to_writer_pretty(&mut writer, &doc)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Quote a CSV cell when it contains a separator, quote, or line break.
fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}
