//! Process-level parallelism: spawn several copies of the current program,
//! each running trials against the same persisted study.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use crate::error::{Error, Result};

/// Subcommand the children are started with.
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Flag carrying each child's 0-based index.
pub const WORKER_INDEX_FLAG: &str = "--worker-index";

/// Arguments passed to every worker after [`WORKER_SUBCOMMAND`].
#[derive(Clone, Debug, Default)]
pub struct WorkerInvocation {
    /// Arguments shared by all workers.
    pub args: Vec<OsString>,
}

impl WorkerInvocation {
    /// Creates an invocation from the shared arguments.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// A fixed-size set of worker processes.
///
/// # Examples
///
/// ```no_run
/// use paramtune::worker::{WorkerInvocation, WorkerPool};
///
/// let pool = WorkerPool::new(12).unwrap();
/// pool.run(&WorkerInvocation::new(["--study-name", "opt_study", "--n-trials", "5"]))
///     .unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct WorkerPool {
    n_jobs: usize,
    program: PathBuf,
}

impl WorkerPool {
    /// Creates a pool that re-executes the current program.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](Error::Io) if the current executable cannot be
    /// determined.
    pub fn new(n_jobs: usize) -> Result<Self> {
        Ok(Self::with_program(n_jobs, std::env::current_exe()?))
    }

    /// Creates a pool that runs `program` instead of the current one.
    #[must_use]
    pub fn with_program(n_jobs: usize, program: impl Into<PathBuf>) -> Self {
        Self {
            n_jobs: n_jobs.max(1),
            program: program.into(),
        }
    }

    /// Returns the number of worker processes.
    #[must_use]
    pub fn n_jobs(&self) -> usize {
        self.n_jobs
    }

    /// Starts every worker and waits for all of them.
    ///
    /// Each child runs `<program> worker <args...> --worker-index <i>` with
    /// inherited standard streams.
    ///
    /// # Errors
    ///
    /// Returns [`Worker`](Error::Worker) naming every worker that could not
    /// be started or exited unsuccessfully. All workers are waited for
    /// before returning.
    pub fn run(&self, invocation: &WorkerInvocation) -> Result<()> {
        tracing::info!(n_jobs = self.n_jobs, program = %self.program.display(), "starting workers");

        let mut failures = Vec::new();
        let mut children: Vec<(usize, Child)> = Vec::with_capacity(self.n_jobs);
        for index in 0..self.n_jobs {
            let spawned = Command::new(&self.program)
                .arg(WORKER_SUBCOMMAND)
                .args(&invocation.args)
                .arg(WORKER_INDEX_FLAG)
                .arg(index.to_string())
                .stdin(Stdio::null())
                .spawn();
            match spawned {
                Ok(child) => {
                    tracing::debug!(worker = index, pid = child.id(), "worker started");
                    children.push((index, child));
                }
                Err(e) => failures.push(format!("worker {index} failed to start: {e}")),
            }
        }

        for (index, mut child) in children {
            match child.wait() {
                Ok(status) if status.success() => {
                    tracing::debug!(worker = index, "worker finished");
                }
                Ok(status) => {
                    tracing::warn!(worker = index, %status, "worker failed");
                    failures.push(format!("worker {index} exited with {status}"));
                }
                Err(e) => failures.push(format!("worker {index} could not be waited on: {e}")),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Worker(failures.join("; ")))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn succeeds_when_every_worker_succeeds() {
        let pool = WorkerPool::with_program(3, "true");
        pool.run(&WorkerInvocation::default()).unwrap();
    }

    #[test]
    fn names_every_failing_worker() {
        let pool = WorkerPool::with_program(2, "false");
        let err = pool.run(&WorkerInvocation::default()).unwrap_err();
        let message = match err {
            Error::Worker(message) => message,
            other => panic!("unexpected error: {other}"),
        };
        assert!(message.contains("worker 0"));
        assert!(message.contains("worker 1"));
    }

    #[test]
    fn missing_program_is_reported() {
        let pool = WorkerPool::with_program(1, "/nonexistent/paramtune-worker");
        assert!(matches!(
            pool.run(&WorkerInvocation::default()),
            Err(Error::Worker(_))
        ));
    }

    #[test]
    fn zero_jobs_means_one() {
        assert_eq!(WorkerPool::with_program(0, "true").n_jobs(), 1);
    }
}
