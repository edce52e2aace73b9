use std::collections::BTreeSet;
use std::io::{self, Write};

use anyhow::Context as _;
use paramtune::storage::{StorageUrl, StudyRecord};
use paramtune::{TrialRecord, TrialState};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ShowArg {
    /// Storage URL: sqlite:///<path>, journal:///<path> or memory
    #[arg(long, env = "PARAMTUNE_STORAGE", default_value = "sqlite:///./opt_study.db")]
    storage: StorageUrl,
    /// Only show this study (default: every study)
    #[arg(long)]
    study_name: Option<String>,
}

pub(crate) fn run(arg: &ShowArg) -> anyhow::Result<()> {
    let storage = arg
        .storage
        .open()
        .with_context(|| format!("failed to open storage {}", arg.storage))?;
    let studies = storage.studies().context("failed to list studies")?;
    let selected: Vec<&StudyRecord> = match &arg.study_name {
        Some(name) => {
            let study = studies
                .iter()
                .find(|s| &s.name == name)
                .with_context(|| format!("study {name} not found"))?;
            vec![study]
        }
        None => studies.iter().collect(),
    };

    let mut out = io::stdout().lock();
    writeln!(out, "studies:")?;
    writeln!(out, "{:>4}  {:<24} {:<9} {}", "id", "name", "direction", "created")?;
    for study in &studies {
        writeln!(
            out,
            "{:>4}  {:<24} {:<9} {}",
            study.id,
            study.name,
            study.direction,
            study.datetime_create.format("%Y-%m-%d %H:%M:%S")
        )?;
    }

    for study in selected {
        let trials = storage
            .trials(study.id)
            .with_context(|| format!("failed to read trials of {}", study.name))?;
        writeln!(out)?;
        print_trials(&mut out, study, &trials)?;
    }
    Ok(())
}

fn print_trials(out: &mut impl Write, study: &StudyRecord, trials: &[TrialRecord]) -> io::Result<()> {
    let count = |state: TrialState| trials.iter().filter(|t| t.state == state).count();
    writeln!(
        out,
        "trials of {} ({} total, {} complete, {} failed, {} running):",
        study.name,
        trials.len(),
        count(TrialState::Complete),
        count(TrialState::Failed),
        count(TrialState::Running),
    )?;

    let names: BTreeSet<&str> = trials
        .iter()
        .flat_map(|t| t.params.keys().map(String::as_str))
        .collect();

    write!(out, "{:>6}  {:<8} {:>12} {:>10}", "number", "state", "value", "time_ms")?;
    for name in &names {
        write!(out, "  {name}")?;
    }
    writeln!(out)?;

    for trial in trials {
        let value = trial.value.map(|v| v.to_string()).unwrap_or_default();
        let elapsed = trial
            .duration()
            .map(|d| d.num_milliseconds().to_string())
            .unwrap_or_default();
        write!(
            out,
            "{:>6}  {:<8} {:>12} {:>10}",
            trial.number, trial.state, value, elapsed
        )?;
        for name in &names {
            match trial.params.get(*name) {
                Some(v) => write!(out, "  {v}")?,
                None => write!(out, "  -")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
