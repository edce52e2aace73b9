use anyhow::Context as _;
use paramtune::Error;
use paramtune::template::ParamTemplate;
use paramtune::worker::{WorkerInvocation, WorkerPool};

use super::{StudyArg, TuneArg, open_study, run_trials};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct OptimizeArg {
    #[clap(flatten)]
    study: StudyArg,
    #[clap(flatten)]
    tune: TuneArg,
    /// Number of worker processes
    #[arg(long, env = "PARAMTUNE_N_JOBS", default_value_t = 12)]
    n_jobs: usize,
}

pub(crate) fn run(arg: &OptimizeArg) -> anyhow::Result<()> {
    let OptimizeArg { study, tune, n_jobs } = arg;

    // Fail before starting workers if the template is unusable.
    let template = ParamTemplate::from_path(&tune.template)
        .with_context(|| format!("failed to load template {}", tune.template.display()))?;
    tracing::info!(
        template = %tune.template.display(),
        ranged = ?template.ranged_names().collect::<Vec<_>>(),
        "tuning parameters"
    );

    let handle = open_study(study, tune, 0)?;
    match handle.best_trial() {
        Ok(best) => tracing::info!(
            number = best.number,
            value = ?best.value,
            params = ?best.params,
            "current best trial"
        ),
        Err(Error::NoCompletedTrials) => {}
        Err(e) => return Err(e).context("failed to read the study"),
    }

    if study.storage.is_shared() {
        let mut args = study.to_args();
        args.extend(tune.to_args());
        WorkerPool::new(*n_jobs)
            .context("failed to locate the current executable")?
            .run(&WorkerInvocation { args })
            .context("optimization workers failed")?;
    } else {
        tracing::warn!(
            storage = %study.storage,
            "storage cannot be shared between processes, running all trials in this process"
        );
        for _ in 0..*n_jobs {
            run_trials(&handle, tune)?;
        }
    }

    let best = handle.best_trial().context("no trial completed")?;
    let summary = serde_json::json!({
        "study": handle.name(),
        "number": best.number,
        "value": best.value,
        "params": best.params,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
