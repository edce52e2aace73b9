use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context as _;

use super::StudyArg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ExportArg {
    #[clap(flatten)]
    study: StudyArg,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Csv)]
    format: Format,
    /// Output file (default: stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ExportArg) -> anyhow::Result<()> {
    let study = arg.study.load()?;
    let writer: Box<dyn io::Write> = match &arg.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    match arg.format {
        Format::Csv => study.to_csv(writer),
        Format::Json => study.to_json(writer),
    }
    .with_context(|| format!("failed to export {}", study.name()))
}
