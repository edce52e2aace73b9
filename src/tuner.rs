//! The tuning objective: template in, score out.

use std::path::{Path, PathBuf};

use crate::command::ScoreCommand;
use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::template::{ParamTemplate, write_params};
use crate::trial::Trial;

/// Placeholder in a params path that is replaced by the trial number.
pub const TRIAL_PLACEHOLDER: &str = "{trial}";

/// Environment variable carrying the resolved params path to the command.
pub const PARAMS_PATH_ENV: &str = "PARAMTUNE_PARAMS_PATH";

/// Environment variable carrying the trial number to the command.
pub const TRIAL_NUMBER_ENV: &str = "PARAMTUNE_TRIAL_NUMBER";

/// An [`Objective`] that samples a [`ParamTemplate`], writes the params
/// file and scores it with an external command.
///
/// Without a [`TRIAL_PLACEHOLDER`] in `params_path` every trial writes the
/// same file, so concurrent workers may overwrite each other's parameters
/// between the write and the command reading them.
#[derive(Clone, Debug)]
pub struct TuneObjective {
    template: ParamTemplate,
    params_path: String,
    command: ScoreCommand,
}

impl TuneObjective {
    /// Creates the objective.
    #[must_use]
    pub fn new(template: ParamTemplate, params_path: impl Into<String>, command: ScoreCommand) -> Self {
        Self {
            template,
            params_path: params_path.into(),
            command,
        }
    }

    /// Loads the template from `template_path` and creates the objective.
    ///
    /// # Errors
    ///
    /// Returns any error of [`ParamTemplate::from_path`].
    pub fn from_template_path(
        template_path: impl AsRef<Path>,
        params_path: impl Into<String>,
        command: ScoreCommand,
    ) -> Result<Self> {
        Ok(Self::new(
            ParamTemplate::from_path(template_path)?,
            params_path,
            command,
        ))
    }

    /// Returns the template.
    #[must_use]
    pub fn template(&self) -> &ParamTemplate {
        &self.template
    }

    /// Resolves the params path for trial `number`.
    ///
    /// ```
    /// use paramtune::command::ScoreCommand;
    /// use paramtune::template::ParamTemplate;
    /// use paramtune::tuner::TuneObjective;
    ///
    /// let objective = TuneObjective::new(
    ///     ParamTemplate::from_json_str("{}").unwrap(),
    ///     "./data/params_{trial}.json",
    ///     ScoreCommand::new("true"),
    /// );
    /// assert_eq!(
    ///     objective.params_path_for(7),
    ///     std::path::PathBuf::from("./data/params_7.json")
    /// );
    /// ```
    #[must_use]
    pub fn params_path_for(&self, number: u64) -> PathBuf {
        PathBuf::from(
            self.params_path
                .replace(TRIAL_PLACEHOLDER, &number.to_string()),
        )
    }
}

impl Objective for TuneObjective {
    type Error = Error;

    fn evaluate(&self, trial: &mut Trial) -> Result<f64> {
        let params = self.template.sample(trial)?;
        let path = self.params_path_for(trial.number());
        write_params(&path, &params)?;
        tracing::debug!(number = trial.number(), path = %path.display(), "wrote params");

        let output = self
            .command
            .clone()
            .env(PARAMS_PATH_ENV, path.to_string_lossy())
            .env(TRIAL_NUMBER_ENV, trial.number().to_string())
            .run()?;

        let elapsed_ms = i64::try_from(output.elapsed.as_millis()).unwrap_or(i64::MAX);
        let stdout_lines = i64::try_from(output.lines.len()).unwrap_or(i64::MAX);
        trial.set_user_attr("elapsed_ms", elapsed_ms);
        trial.set_user_attr("stdout_lines", stdout_lines);

        #[allow(clippy::cast_precision_loss)]
        let score = output.score as f64;
        Ok(score)
    }
}
