use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors returned by the tuning library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the lower bound is greater than the upper bound.
    #[error("invalid bounds: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when log scale is used with non-positive bounds.
    #[error("invalid log bounds: low must be positive for log scale")]
    InvalidLogBounds,

    /// Returned when step size is not positive.
    #[error("invalid step: step must be positive")]
    InvalidStep,

    /// Returned when a parameter is suggested twice with a different configuration.
    #[error("parameter conflict for '{name}': {reason}")]
    ParameterConflict {
        /// The name of the conflicting parameter.
        name: String,
        /// The reason for the conflict.
        reason: String,
    },

    /// Returned when requesting the best trial but no trials have completed.
    #[error("no completed trials available")]
    NoCompletedTrials,

    /// Returned when gamma is not in the valid range (0.0, 1.0).
    #[error("invalid gamma: {0} must be in (0.0, 1.0)")]
    InvalidGamma(f64),

    /// Returned when KDE is created with empty samples.
    #[error("KDE requires at least one sample")]
    EmptySamples,

    /// Returned when a parameter template entry cannot be interpreted.
    #[error("invalid template entry '{name}': {reason}")]
    InvalidTemplate {
        /// The template key.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Returned when the template document is not a JSON object.
    #[error("parameter template must be a JSON object")]
    TemplateNotObject,

    /// Returned when a file cannot be read or written.
    #[error("{path}: {source}")]
    File {
        /// The file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Returned when an I/O operation without an associated path fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when JSON encoding or decoding fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Returned when the scoring command exits unsuccessfully.
    #[error("scoring command failed with {status}; last output: {stdout_tail:?}")]
    CommandFailed {
        /// The exit status of the child.
        status: ExitStatus,
        /// The last non-empty stdout lines, for diagnostics.
        stdout_tail: Vec<String>,
    },

    /// Returned when the scoring command printed no non-empty line.
    #[error("scoring command produced no output line")]
    NoScoreLine,

    /// Returned when the last output line is not an integer.
    #[error("cannot parse score from last output line {line:?}")]
    InvalidScore {
        /// The offending line.
        line: String,
    },

    /// Returned when a storage URL cannot be parsed.
    #[error("invalid storage url '{0}': expected sqlite:///<path>, journal:///<path> or memory")]
    InvalidStorageUrl(String),

    /// Returned when a storage operation fails.
    #[error("storage error: {0}")]
    Storage(String),

    /// Returned when a study name is not present in the storage.
    #[error("study '{0}' not found")]
    StudyNotFound(String),

    /// Returned when creating a study whose name already exists.
    #[error("study '{0}' already exists")]
    DuplicatedStudy(String),

    /// Returned when an existing study is opened with another direction.
    #[error("study '{name}' was created to {stored:?}, requested {requested:?}")]
    DirectionMismatch {
        /// The study name.
        name: String,
        /// Direction recorded in storage.
        stored: crate::Direction,
        /// Direction requested by the caller.
        requested: crate::Direction,
    },

    /// Returned when an objective function fails for a trial.
    #[error("trial {number} failed: {message}")]
    TrialFailed {
        /// Per-study trial number.
        number: u64,
        /// The objective's error message.
        message: String,
    },

    /// Returned when one or more worker processes fail.
    #[error("worker failure: {0}")]
    Worker(String),

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl Error {
    pub(crate) fn file(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Error::File { path, source }
    }
}
