//! End-to-end tests of the `paramtune` binary and its worker processes.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use paramtune::sampler::RandomSampler;
use paramtune::storage::{SqliteStorage, Storage};
use paramtune::{Study, TrialState};

fn temp_dir() -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut path = std::env::temp_dir();
    path.push(format!(
        "paramtune_cli_test_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&path).unwrap();
    path
}

fn optimize(dir: &Path, command: &str, n_jobs: usize, n_trials: usize) -> Output {
    let template = dir.join("template.json");
    std::fs::write(&template, r#"{"TURN": 3, "PER": [0.0, 1.0]}"#).unwrap();

    Command::new(env!("CARGO_BIN_EXE_paramtune"))
        .arg("optimize")
        .arg("--study-name")
        .arg("cli")
        .arg("--storage")
        .arg(format!("sqlite:///{}", dir.join("study.db").display()))
        .arg("--template")
        .arg(&template)
        .arg("--params-path")
        .arg(dir.join("p_{trial}.json"))
        .arg("--command")
        .arg(command)
        .arg("--n-jobs")
        .arg(n_jobs.to_string())
        .arg("--n-trials")
        .arg(n_trials.to_string())
        .arg("--seed")
        .arg("1")
        .env_remove("PARAMTUNE_DIRECTION")
        .env_remove("PARAMTUNE_SAMPLER")
        .env_remove("PARAMTUNE_WORKDIR")
        .env_remove("PARAMTUNE_CATCH_FAILURES")
        .output()
        .unwrap()
}

fn load(dir: &Path) -> Study {
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(dir.join("study.db")).unwrap());
    Study::load("cli", storage, RandomSampler::new()).unwrap()
}

#[test]
fn workers_share_one_study() {
    let dir = temp_dir();
    let output = optimize(&dir, "echo 3", 2, 2);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["study"], "cli");
    assert_eq!(summary["value"], 3.0);
    assert!(summary["params"]["PER"].is_number());

    let trials = load(&dir).trials().unwrap();
    let mut numbers: Vec<u64> = trials.iter().map(|t| t.number).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, [0, 1, 2, 3]);
    assert!(trials.iter().all(|t| t.state == TrialState::Complete));
    for n in 0..4 {
        let written = std::fs::read_to_string(dir.join(format!("p_{n}.json"))).unwrap();
        assert!(written.contains("\"TURN\": 3"));
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn failing_command_fails_the_run() {
    let dir = temp_dir();
    let output = optimize(&dir, "exit 1", 2, 1);
    assert!(!output.status.success());

    let trials = load(&dir).trials().unwrap();
    assert_eq!(trials.len(), 2);
    assert!(trials.iter().all(|t| t.state == TrialState::Failed));

    std::fs::remove_dir_all(&dir).ok();
}
