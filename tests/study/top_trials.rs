use paramtune::{Error, Study};

fn study_with_values(maximize: bool, values: &[f64]) -> Study {
    let builder = Study::builder();
    let builder = if maximize { builder.maximize() } else { builder.minimize() };
    let study = builder.create().unwrap();
    for &v in values {
        let trial = study.ask().unwrap();
        study.complete_trial(trial, v).unwrap();
    }
    study
}

#[test]
fn test_top_trials_minimize() {
    let study = study_with_values(false, &[5.0, 1.0, 3.0, 2.0]);
    let top: Vec<f64> = study
        .top_trials(3)
        .unwrap()
        .iter()
        .filter_map(|t| t.value)
        .collect();
    assert_eq!(top, [1.0, 2.0, 3.0]);
}

#[test]
fn test_top_trials_maximize() {
    let study = study_with_values(true, &[5.0, 1.0, 3.0, 2.0]);
    let top: Vec<f64> = study
        .top_trials(2)
        .unwrap()
        .iter()
        .filter_map(|t| t.value)
        .collect();
    assert_eq!(top, [5.0, 3.0]);
}

#[test]
fn test_ties_prefer_earlier_trials() {
    let study = study_with_values(true, &[4.0, 4.0]);
    assert_eq!(study.best_trial().unwrap().number, 0);
}

#[test]
fn test_failed_trials_are_not_ranked() {
    let study = study_with_values(false, &[3.0]);
    let trial = study.ask().unwrap();
    study.fail_trial(trial, "nope").unwrap();
    assert_eq!(study.top_trials(10).unwrap().len(), 1);
}

#[test]
fn test_best_of_empty_study() {
    let study = study_with_values(false, &[]);
    assert!(matches!(study.best_trial(), Err(Error::NoCompletedTrials)));
    assert!(matches!(study.best_params(), Err(Error::NoCompletedTrials)));
}
