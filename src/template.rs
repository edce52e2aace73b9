//! Parameter templates: the JSON document the scored program reads, with
//! some entries replaced by ranges to tune.
//!
//! Every top-level key of the template is either
//!
//! - a **range**: a two-element numeric array `[low, high]` (a uniform
//!   float), or an object `{"low": l, "high": h}` with optional `"log"`,
//!   `"step"` and `"int"` keys;
//! - a **fixed value**: anything else, copied to the output unchanged.
//!
//! ```
//! use paramtune::Trial;
//! use paramtune::template::ParamTemplate;
//!
//! let template = ParamTemplate::from_json_str(
//!     r#"{"PER": [0.0, 2.0], "DEPTH": {"low": 1, "high": 8, "int": true}, "MODE": "fast"}"#,
//! )
//! .unwrap();
//! assert_eq!(template.ranged_names().collect::<Vec<_>>(), ["PER", "DEPTH"]);
//!
//! let mut trial = Trial::new(0, 0);
//! let params = template.sample(&mut trial).unwrap();
//! assert_eq!(params.keys().collect::<Vec<_>>(), ["PER", "DEPTH", "MODE"]);
//! assert_eq!(params["MODE"], "fast");
//! assert!(params["DEPTH"].is_i64());
//! ```

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::parameter::{FloatParam, IntParam, Parameter};
use crate::trial::Trial;

/// Keys of the object form of a range entry.
const RANGE_KEYS: [&str; 5] = ["low", "high", "log", "step", "int"];

/// The object form of a range entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeSpec {
    low: f64,
    high: f64,
    #[serde(default)]
    log: bool,
    step: Option<f64>,
    #[serde(default)]
    int: bool,
}

/// One top-level entry of a [`ParamTemplate`].
#[derive(Clone, Debug)]
pub enum TemplateEntry {
    /// Copied to the output verbatim.
    Fixed(Value),
    /// Sampled as a float.
    Float(FloatParam),
    /// Sampled as an integer.
    Int(IntParam),
}

impl TemplateEntry {
    /// Returns `true` for entries that are sampled per trial.
    #[must_use]
    pub fn is_ranged(&self) -> bool {
        !matches!(self, TemplateEntry::Fixed(_))
    }

    fn parse(name: &str, value: Value) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidTemplate {
            name: name.to_owned(),
            reason,
        };

        let entry = match &value {
            Value::Array(items) if items.len() == 2 && items.iter().all(Value::is_number) => {
                let (Some(low), Some(high)) = (items[0].as_f64(), items[1].as_f64()) else {
                    return Err(invalid("range bounds must be numbers".to_owned()));
                };
                TemplateEntry::Float(FloatParam::new(name, low, high))
            }
            Value::Object(map)
                if map.contains_key("low")
                    && map.contains_key("high")
                    && map.keys().all(|k| RANGE_KEYS.contains(&k.as_str())) =>
            {
                let range: RangeSpec =
                    serde_json::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;
                Self::from_range(name, &range).map_err(invalid)?
            }
            _ => return Ok(TemplateEntry::Fixed(value)),
        };

        let checked = match &entry {
            TemplateEntry::Float(p) => p.validate(),
            TemplateEntry::Int(p) => p.validate(),
            TemplateEntry::Fixed(_) => Ok(()),
        };
        checked.map_err(|e| invalid(e.to_string()))?;
        Ok(entry)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_range(name: &str, range: &RangeSpec) -> core::result::Result<Self, String> {
        if range.int {
            let as_int = |v: f64, what: &str| {
                if v.is_finite() && v.fract() == 0.0 {
                    Ok(v as i64)
                } else {
                    Err(format!("{what} must be an integer for an int range"))
                }
            };
            let low = as_int(range.low, "low")?;
            let high = as_int(range.high, "high")?;
            let mut param = IntParam::new(name, low, high);
            if range.log {
                param = param.log_scale();
            }
            if let Some(step) = range.step {
                param = param.step(as_int(step, "step")?);
            }
            Ok(TemplateEntry::Int(param))
        } else {
            let mut param = FloatParam::new(name, range.low, range.high);
            if range.log {
                param = param.log_scale();
            }
            if let Some(step) = range.step {
                param = param.step(step);
            }
            Ok(TemplateEntry::Float(param))
        }
    }
}

/// A parsed parameter template, in file order.
#[derive(Clone, Debug)]
pub struct ParamTemplate {
    entries: Vec<(String, TemplateEntry)>,
}

impl ParamTemplate {
    /// Reads and parses the template at `path`.
    ///
    /// # Errors
    ///
    /// Returns a file error if the file cannot be read, or any error of
    /// [`from_json_str`](Self::from_json_str).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(Error::file(path))?;
        let template = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            entries = template.entries.len(),
            ranged = template.ranged_names().count(),
            "loaded parameter template"
        );
        Ok(template)
    }

    /// Parses a template from JSON text.
    ///
    /// # Errors
    ///
    /// - [`Json`](Error::Json) for malformed JSON.
    /// - [`TemplateNotObject`](Error::TemplateNotObject) if the top level is
    ///   not an object.
    /// - [`InvalidTemplate`](Error::InvalidTemplate) for a range with bad
    ///   bounds, log bounds or step.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let Value::Object(map) = serde_json::from_str::<Value>(text)? else {
            return Err(Error::TemplateNotObject);
        };
        let entries = map
            .into_iter()
            .map(|(name, value)| {
                let entry = TemplateEntry::parse(&name, value)?;
                Ok((name, entry))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Returns the entries in template order.
    #[must_use]
    pub fn entries(&self) -> &[(String, TemplateEntry)] {
        &self.entries
    }

    /// Names of the ranged entries, in template order.
    pub fn ranged_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_ranged())
            .map(|(name, _)| name.as_str())
    }

    /// Produces a concrete parameter set for `trial`.
    ///
    /// Fixed entries are cloned; ranged entries are suggested through the
    /// trial, so they are recorded in the study.
    ///
    /// # Errors
    ///
    /// Returns an error if a suggestion conflicts with an earlier one of
    /// the same trial.
    pub fn sample(&self, trial: &mut Trial) -> Result<Map<String, Value>> {
        let mut params = Map::new();
        for (name, entry) in &self.entries {
            let value = match entry {
                TemplateEntry::Fixed(value) => value.clone(),
                TemplateEntry::Float(param) => {
                    let v = param.suggest(trial)?;
                    serde_json::Number::from_f64(v)
                        .map(Value::Number)
                        .ok_or(Error::Internal("sampled a non-finite float"))?
                }
                TemplateEntry::Int(param) => Value::from(param.suggest(trial)?),
            };
            params.insert(name.clone(), value);
        }
        Ok(params)
    }
}

/// Writes `params` to `path` as JSON indented by four spaces, creating
/// parent directories as needed.
///
/// # Errors
///
/// Returns a file error if the directory or file cannot be written.
pub fn write_params(path: impl AsRef<Path>, params: &Map<String, Value>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(Error::file(parent))?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    params.serialize(&mut serializer)?;

    std::fs::write(path, buf).map_err(Error::file(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_element_numeric_arrays_are_float_ranges() {
        let t = ParamTemplate::from_json_str(r#"{"a": [1, 5], "b": [1, "x"], "c": [1, 2, 3]}"#)
            .unwrap();
        assert!(matches!(t.entries()[0].1, TemplateEntry::Float(_)));
        assert!(matches!(t.entries()[1].1, TemplateEntry::Fixed(_)));
        assert!(matches!(t.entries()[2].1, TemplateEntry::Fixed(_)));
    }

    #[test]
    fn objects_without_bounds_are_fixed() {
        let t = ParamTemplate::from_json_str(r#"{"nested": {"low": 1}}"#).unwrap();
        assert!(!t.entries()[0].1.is_ranged());
    }

    #[test]
    fn objects_with_other_keys_are_fixed() {
        let t = ParamTemplate::from_json_str(r#"{"window": {"low": 1, "high": 5, "unit": "ms"}}"#)
            .unwrap();
        assert!(matches!(
            &t.entries()[0].1,
            TemplateEntry::Fixed(v) if v["unit"] == "ms" && v["low"] == 1
        ));
    }

    #[test]
    fn malformed_range_objects_are_rejected() {
        let err = ParamTemplate::from_json_str(r#"{"x": {"low": 0, "high": 1, "log": "yes"}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { name, .. } if name == "x"));
    }

    #[test]
    fn int_ranges_need_integral_bounds() {
        let err = ParamTemplate::from_json_str(r#"{"n": {"low": 0.5, "high": 3, "int": true}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
    }

    #[test]
    fn reversed_bounds_are_rejected() {
        let err = ParamTemplate::from_json_str(r#"{"x": [2.0, 1.0]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { name, .. } if name == "x"));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(matches!(
            ParamTemplate::from_json_str("[1, 2]"),
            Err(Error::TemplateNotObject)
        ));
    }
}
