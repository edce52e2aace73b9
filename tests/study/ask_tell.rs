use paramtune::parameter::{FloatParam, Parameter};
use paramtune::sampler::TpeSampler;
use paramtune::{Study, TrialState};

#[test]
fn test_ask_and_tell_basic() {
    let study = Study::builder().minimize().create().unwrap();
    let x_param = FloatParam::new("x", 0.0, 10.0);

    for _ in 0..10 {
        let mut trial = study.ask().unwrap();
        let x = x_param.suggest(&mut trial).unwrap();
        study.tell(trial, Ok::<_, &str>(x * x)).unwrap();
    }

    assert_eq!(study.n_trials().unwrap(), 10);
    assert!(study.best_value().unwrap() >= 0.0);
}

#[test]
fn test_ask_and_tell_with_failures() {
    let study = Study::builder().minimize().create().unwrap();
    let x_param = FloatParam::new("x", -5.0, 5.0);

    for i in 0..10 {
        let mut trial = study.ask().unwrap();
        let x = x_param.suggest(&mut trial).unwrap();
        if i % 2 == 0 {
            study.tell(trial, Ok::<_, &str>(x * x)).unwrap();
        } else {
            study.tell(trial, Err::<f64, _>("simulated failure")).unwrap();
        }
    }

    let trials = study.trials().unwrap();
    assert_eq!(trials.len(), 10);
    assert_eq!(
        trials
            .iter()
            .filter(|t| t.state == TrialState::Failed)
            .count(),
        5
    );
    assert!(
        trials
            .iter()
            .filter(|t| t.state == TrialState::Failed)
            .all(|t| t.value.is_none())
    );
}

#[test]
fn test_ask_and_tell_with_tpe_sampler() {
    let sampler = TpeSampler::builder()
        .seed(42)
        .n_startup_trials(5)
        .build()
        .unwrap();
    let study = Study::builder().minimize().sampler(sampler).create().unwrap();
    let x_param = FloatParam::new("x", -10.0, 10.0);

    for _ in 0..30 {
        let mut trial = study.ask().unwrap();
        let x = x_param.suggest(&mut trial).unwrap();
        study.tell(trial, Ok::<_, &str>((x - 3.0).powi(2))).unwrap();
    }

    assert_eq!(study.n_trials().unwrap(), 30);
    assert!(
        study.best_value().unwrap() < 5.0,
        "TPE ask-and-tell should find a reasonable value"
    );
}

#[test]
fn test_trial_numbers_follow_reservation_order() {
    let study = Study::builder().create().unwrap();
    let first = study.ask().unwrap();
    let second = study.ask().unwrap();
    assert_eq!((first.number(), second.number()), (0, 1));

    // Running trials count toward the total.
    assert_eq!(study.n_trials().unwrap(), 2);
    study.tell(second, Ok::<_, &str>(1.0)).unwrap();
    study.tell(first, Ok::<_, &str>(2.0)).unwrap();
    assert_eq!(study.best_trial().unwrap().number, 1);
}
