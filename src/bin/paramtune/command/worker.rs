use super::{StudyArg, TuneArg, open_study, run_trials};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct WorkerArg {
    #[clap(flatten)]
    study: StudyArg,
    #[clap(flatten)]
    tune: TuneArg,
    /// Index of this worker inside the pool
    #[arg(long, default_value_t = 0)]
    worker_index: u64,
}

pub(crate) fn run(arg: &WorkerArg) -> anyhow::Result<()> {
    let _span = tracing::info_span!("worker", index = arg.worker_index).entered();
    let study = open_study(&arg.study, &arg.tune, arg.worker_index)?;
    run_trials(&study, &arg.tune)?;
    tracing::info!(n_trials = arg.tune.n_trials, "worker done");
    Ok(())
}
