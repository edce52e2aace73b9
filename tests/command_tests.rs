//! Integration tests for the scoring command and the tuning objective.
#![cfg(unix)]

use std::sync::Arc;

use paramtune::command::ScoreCommand;
use paramtune::storage::{MemoryStorage, Storage};
use paramtune::template::ParamTemplate;
use paramtune::tuner::TuneObjective;
use paramtune::{AttrValue, Error, Study, TrialState};

fn temp_dir() -> std::path::PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let mut path = std::env::temp_dir();
    path.push(format!(
        "paramtune_command_test_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    path
}

#[test]
fn echoed_number_is_the_score() {
    let output = ScoreCommand::new("printf 'turn 1\\nturn 2\\n\\n1234\\n\\n'")
        .run()
        .unwrap();
    assert_eq!(output.score, 1234);
    assert_eq!(output.lines, ["turn 1", "turn 2", "1234"]);
}

#[test]
fn non_zero_exit_is_a_failure() {
    let err = ScoreCommand::new("echo 5; exit 3").run().unwrap_err();
    match err {
        Error::CommandFailed {
            status,
            stdout_tail,
        } => {
            assert_eq!(status.code(), Some(3));
            assert_eq!(stdout_tail, ["5"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn output_without_a_number_is_rejected() {
    let err = ScoreCommand::new("echo done").run().unwrap_err();
    assert!(matches!(err, Error::InvalidScore { line } if line == "done"));

    let err = ScoreCommand::new("true").run().unwrap_err();
    assert!(matches!(err, Error::NoScoreLine));
}

#[test]
fn env_and_workdir_reach_the_child() {
    let dir = temp_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("score.txt"), "77\n").unwrap();

    let output = ScoreCommand::new("cat score.txt; echo $((BASE + 1))")
        .workdir(&dir)
        .env("BASE", "41")
        .run()
        .unwrap();
    assert_eq!(output.score, 42);
    assert_eq!(output.lines, ["77", "42"]);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn objective_scores_the_written_params_file() {
    let dir = temp_dir();
    let params_path = dir.join("params_{trial}.json");
    let template =
        ParamTemplate::from_json_str(r#"{"PER": [0.0, 1.0], "SCORE": 17}"#).unwrap();
    // Read the fixed value back out of the file the trial wrote.
    let command = ScoreCommand::new(
        r#"sed -n 's/.*"SCORE": \([0-9]*\).*/\1/p' "$PARAMTUNE_PARAMS_PATH"; echo "trial $PARAMTUNE_TRIAL_NUMBER" >&2"#,
    );
    let objective = TuneObjective::new(template, params_path.to_string_lossy(), command);

    let study = Study::builder().maximize().create().unwrap();
    study.optimize(3, objective).unwrap();

    let trials = study.trials().unwrap();
    assert_eq!(trials.len(), 3);
    for trial in &trials {
        assert_eq!(trial.value, Some(17.0));
        assert!(trial.params.contains_key("PER"));
        assert!(matches!(trial.user_attrs["elapsed_ms"], AttrValue::Int(ms) if ms >= 0));
        assert_eq!(trial.user_attrs["stdout_lines"], AttrValue::Int(1));
        assert!(dir.join(format!("params_{}.json", trial.number)).exists());
    }

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn trial_number_is_exported() {
    let dir = temp_dir();
    let objective = TuneObjective::new(
        ParamTemplate::from_json_str("{}").unwrap(),
        dir.join("params.json").to_string_lossy(),
        ScoreCommand::new("echo $PARAMTUNE_TRIAL_NUMBER"),
    );

    let study = Study::builder().maximize().create().unwrap();
    study.optimize(4, objective).unwrap();
    assert_eq!(study.best_value().unwrap(), 3.0);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn failing_command_stores_a_failed_trial_and_stops() {
    let dir = temp_dir();
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let objective = TuneObjective::new(
        ParamTemplate::from_json_str(r#"{"PER": [0.0, 1.0]}"#).unwrap(),
        dir.join("params.json").to_string_lossy(),
        ScoreCommand::new("exit 1"),
    );

    let study = Study::builder()
        .name("failing")
        .maximize()
        .storage(Arc::clone(&storage))
        .create()
        .unwrap();
    let err = study.optimize(5, objective).unwrap_err();
    assert!(matches!(err, Error::TrialFailed { number: 0, .. }));

    let trials = study.trials().unwrap();
    assert_eq!(trials.len(), 1);
    assert_eq!(trials[0].state, TrialState::Failed);
    assert!(trials[0].user_attrs.contains_key("fail_reason"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn caught_failures_keep_the_loop_going() {
    let dir = temp_dir();
    let objective = TuneObjective::new(
        ParamTemplate::from_json_str("{}").unwrap(),
        dir.join("params.json").to_string_lossy(),
        // Odd trial numbers fail.
        ScoreCommand::new("test $((PARAMTUNE_TRIAL_NUMBER % 2)) -eq 0 && echo 1"),
    );

    let study = Study::builder()
        .maximize()
        .catch_failures(true)
        .create()
        .unwrap();
    study.optimize(4, objective).unwrap();

    let states: Vec<_> = study.trials().unwrap().iter().map(|t| t.state).collect();
    assert_eq!(
        states,
        [
            TrialState::Complete,
            TrialState::Failed,
            TrialState::Complete,
            TrialState::Failed
        ]
    );

    std::fs::remove_dir_all(&dir).ok();
}
