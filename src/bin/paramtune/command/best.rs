use anyhow::Context as _;

use super::StudyArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct BestArg {
    #[clap(flatten)]
    study: StudyArg,
}

pub(crate) fn run(arg: &BestArg) -> anyhow::Result<()> {
    let study = arg.study.load()?;
    let best = study
        .best_trial()
        .with_context(|| format!("study {} has no best trial", study.name()))?;
    let doc = serde_json::json!({
        "study": study.name(),
        "direction": study.direction(),
        "number": best.number,
        "value": best.value,
        "params": best.params,
        "user_attrs": best.user_attrs,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
