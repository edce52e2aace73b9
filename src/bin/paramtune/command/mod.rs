use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use paramtune::command::ScoreCommand;
use paramtune::sampler::{RandomSampler, SamplerKind};
use paramtune::storage::StorageUrl;
use paramtune::tuner::TuneObjective;
use paramtune::{Direction, Study};

use self::{
    best::BestArg, export::ExportArg, optimize::OptimizeArg, show::ShowArg, worker::WorkerArg,
};

mod best;
mod export;
mod optimize;
mod show;
mod worker;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run the study with parallel worker processes
    Optimize(#[clap(flatten)] OptimizeArg),
    /// Run trials in this process (started by `optimize`)
    #[command(hide = true)]
    Worker(#[clap(flatten)] WorkerArg),
    /// List studies and their trials
    Show(#[clap(flatten)] ShowArg),
    /// Print the best trial as JSON
    Best(#[clap(flatten)] BestArg),
    /// Dump every trial as CSV or JSON
    Export(#[clap(flatten)] ExportArg),
}

pub(crate) fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Optimize(arg) => optimize::run(&arg)?,
        Mode::Worker(arg) => worker::run(&arg)?,
        Mode::Show(arg) => show::run(&arg)?,
        Mode::Best(arg) => best::run(&arg)?,
        Mode::Export(arg) => export::run(&arg)?,
    }
    Ok(())
}

/// Where the study lives.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct StudyArg {
    /// Study name
    #[arg(long, env = "PARAMTUNE_STUDY_NAME", default_value = "opt_study")]
    study_name: String,
    /// Storage URL: sqlite:///<path>, journal:///<path> or memory
    #[arg(long, env = "PARAMTUNE_STORAGE", default_value = "sqlite:///./opt_study.db")]
    storage: StorageUrl,
}

impl StudyArg {
    fn to_args(&self) -> Vec<OsString> {
        vec![
            "--study-name".into(),
            self.study_name.clone().into(),
            "--storage".into(),
            self.storage.to_string().into(),
        ]
    }

    /// Load an existing study for inspection.
    fn load(&self) -> anyhow::Result<Study> {
        let storage = self
            .storage
            .open()
            .with_context(|| format!("failed to open storage {}", self.storage))?;
        Study::load(&self.study_name, storage, RandomSampler::new())
            .with_context(|| format!("failed to load study {}", self.study_name))
    }
}

/// How each trial is produced and scored.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TuneArg {
    /// Parameter template (JSON object; `[low, high]` entries are tuned)
    #[arg(long, env = "PARAMTUNE_TEMPLATE", default_value = "./data/params_default.json")]
    template: PathBuf,
    /// Parameter file written for each trial; `{trial}` is replaced by the trial number
    #[arg(long, env = "PARAMTUNE_PARAMS_FILE", default_value = "./data/params.json")]
    params_path: String,
    /// Shell command printing the score on its last output line
    #[arg(long, env = "PARAMTUNE_COMMAND", default_value = "./target/release/procon31-comp")]
    command: String,
    /// Working directory of the scoring command
    #[arg(long, env = "PARAMTUNE_WORKDIR")]
    workdir: Option<PathBuf>,
    /// Optimization direction (minimize or maximize)
    #[arg(long, env = "PARAMTUNE_DIRECTION", default_value = "maximize")]
    direction: Direction,
    /// Sampler (tpe or random)
    #[arg(long, env = "PARAMTUNE_SAMPLER", default_value = "tpe")]
    sampler: SamplerKind,
    /// Trials per worker
    #[arg(long, env = "PARAMTUNE_N_TRIALS", default_value_t = 5)]
    n_trials: usize,
    /// Base sampler seed; worker `i` uses `seed + i`
    #[arg(long, env = "PARAMTUNE_SEED")]
    seed: Option<u64>,
    /// Keep going after a failed trial
    #[arg(long, env = "PARAMTUNE_CATCH_FAILURES")]
    catch_failures: bool,
}

impl TuneArg {
    fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--template".into(),
            self.template.clone().into(),
            "--params-path".into(),
            self.params_path.clone().into(),
            "--command".into(),
            self.command.clone().into(),
            "--direction".into(),
            self.direction.as_str().to_ascii_lowercase().into(),
            "--sampler".into(),
            self.sampler.to_string().into(),
            "--n-trials".into(),
            self.n_trials.to_string().into(),
        ];
        if let Some(workdir) = &self.workdir {
            args.push("--workdir".into());
            args.push(workdir.clone().into());
        }
        if let Some(seed) = self.seed {
            args.push("--seed".into());
            args.push(seed.to_string().into());
        }
        if self.catch_failures {
            args.push("--catch-failures".into());
        }
        args
    }

    fn objective(&self) -> anyhow::Result<TuneObjective> {
        let mut command = ScoreCommand::new(&self.command);
        if let Some(dir) = &self.workdir {
            command = command.workdir(dir);
        }
        TuneObjective::from_template_path(&self.template, &self.params_path, command)
            .with_context(|| format!("failed to load template {}", self.template.display()))
    }
}

/// Create the study if needed and return a handle that samples with the
/// configured sampler.
fn open_study(study: &StudyArg, tune: &TuneArg, worker_index: u64) -> anyhow::Result<Study> {
    let storage = study
        .storage
        .open()
        .with_context(|| format!("failed to open storage {}", study.storage))?;
    let seed = tune.seed.map(|s| s.wrapping_add(worker_index));
    let sampler = tune
        .sampler
        .build(seed)
        .with_context(|| format!("failed to build the {} sampler", tune.sampler))?;
    Study::builder()
        .name(&study.study_name)
        .direction(tune.direction)
        .boxed_sampler(sampler)
        .storage(storage)
        .load_if_exists(true)
        .catch_failures(tune.catch_failures)
        .create()
        .with_context(|| format!("failed to open study {}", study.study_name))
}

/// Run this process's share of trials.
fn run_trials(study: &Study, tune: &TuneArg) -> anyhow::Result<()> {
    let objective = tune.objective()?;
    study
        .optimize(tune.n_trials, objective)
        .with_context(|| format!("optimization of {} failed", study.name()))
}
