//! The external scoring command.
//!
//! The command is run through `sh -c`, its standard output is captured and
//! the last non-empty line is parsed as an integer score. Standard error is
//! inherited so the scored program's diagnostics reach the terminal.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// How many trailing stdout lines a [`CommandFailed`](Error::CommandFailed)
/// error carries.
const FAILURE_TAIL: usize = 5;

/// A shell command whose output ends with a score.
#[derive(Clone, Debug)]
pub struct ScoreCommand {
    /// Command line passed to `sh -c`.
    pub program: String,
    /// Working directory; the current one when `None`.
    pub workdir: Option<PathBuf>,
    /// Extra environment variables for the child.
    pub env: Vec<(String, String)>,
}

/// Captured result of one [`ScoreCommand::run`].
#[derive(Clone, Debug)]
pub struct CommandOutput {
    /// Non-empty stdout lines, in order.
    pub lines: Vec<String>,
    /// The parsed score.
    pub score: i64,
    /// Wall-clock time of the child process.
    pub elapsed: Duration,
}

impl ScoreCommand {
    /// Creates a command with no extra environment.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            workdir: None,
            env: Vec::new(),
        }
    }

    /// Sets the working directory of the child.
    #[must_use]
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Adds an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Runs the command and parses its score.
    ///
    /// # Errors
    ///
    /// - [`Io`](Error::Io) if the shell cannot be spawned.
    /// - [`CommandFailed`](Error::CommandFailed) on a non-zero exit status.
    /// - [`NoScoreLine`](Error::NoScoreLine) /
    ///   [`InvalidScore`](Error::InvalidScore) from [`parse_score`].
    pub fn run(&self) -> Result<CommandOutput> {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(&self.program)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        tracing::debug!(program = %self.program, "running scoring command");
        let started = Instant::now();
        let output = command.output()?;
        let elapsed = started.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let lines: Vec<String> = non_empty_lines(&stdout).map(str::to_owned).collect();
        for line in &lines {
            tracing::debug!(line = %line, "stdout");
        }
        tracing::info!(lines = ?lines, elapsed_ms = elapsed.as_millis(), "scoring command finished");

        if !output.status.success() {
            let tail = lines[lines.len().saturating_sub(FAILURE_TAIL)..].to_vec();
            return Err(Error::CommandFailed {
                status: output.status,
                stdout_tail: tail,
            });
        }

        let score = parse_score(&stdout)?;
        Ok(CommandOutput {
            lines,
            score,
            elapsed,
        })
    }
}

fn non_empty_lines(stdout: &str) -> impl Iterator<Item = &str> {
    stdout.split('\n').map(str::trim).filter(|l| !l.is_empty())
}

/// Parses the last non-empty line of `stdout` as an integer.
///
/// Lines containing only whitespace (including a lone `\r`) count as empty.
///
/// # Errors
///
/// - [`NoScoreLine`](Error::NoScoreLine) if there is no non-empty line.
/// - [`InvalidScore`](Error::InvalidScore) if the last one is not an `i64`.
///
/// # Examples
///
/// ```
/// use paramtune::command::parse_score;
///
/// assert_eq!(parse_score("turn 1\nturn 2\n1234\n\n").unwrap(), 1234);
/// assert_eq!(parse_score("-7\r\n").unwrap(), -7);
/// assert!(parse_score("\n\n").is_err());
/// assert!(parse_score("score: 12").is_err());
/// ```
pub fn parse_score(stdout: &str) -> Result<i64> {
    let line = non_empty_lines(stdout).last().ok_or(Error::NoScoreLine)?;
    line.parse().map_err(|_| Error::InvalidScore {
        line: line.to_owned(),
    })
}
