use core::ops::ControlFlow;
use std::cell::Cell;
use std::rc::Rc;

use paramtune::parameter::{FloatParam, Parameter};
use paramtune::sampler::RandomSampler;
use paramtune::{Error, Objective, Study, Trial, TrialRecord, TrialState};

struct Counting {
    x: FloatParam,
    before: Rc<Cell<usize>>,
    after: Rc<Cell<usize>>,
    stop_after: usize,
}

impl Objective for Counting {
    type Error = Error;

    fn evaluate(&self, trial: &mut Trial) -> Result<f64, Error> {
        self.x.suggest(trial)
    }

    fn before_trial(&self, _study: &Study) -> ControlFlow<()> {
        self.before.set(self.before.get() + 1);
        ControlFlow::Continue(())
    }

    fn after_trial(&self, _study: &Study, _trial: &TrialRecord) -> ControlFlow<()> {
        self.after.set(self.after.get() + 1);
        if self.after.get() >= self.stop_after {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

#[test]
fn test_after_trial_stops_the_loop() {
    let study = Study::builder().create().unwrap();
    let before = Rc::new(Cell::new(0));
    let after = Rc::new(Cell::new(0));
    let objective = Counting {
        x: FloatParam::new("x", 0.0, 1.0),
        before: Rc::clone(&before),
        after: Rc::clone(&after),
        stop_after: 3,
    };
    study.optimize(10, objective).unwrap();

    assert_eq!(before.get(), 3);
    assert_eq!(after.get(), 3);
    assert_eq!(study.n_trials().unwrap(), 3);
}

#[test]
fn test_closure_objective() {
    let study = Study::builder()
        .maximize()
        .sampler(RandomSampler::with_seed(3))
        .create()
        .unwrap();
    let x = FloatParam::new("x", -1.0, 1.0);
    study
        .optimize(15, |trial: &mut Trial| {
            let v = x.suggest(trial)?;
            Ok::<_, Error>(-v * v)
        })
        .unwrap();

    let best = study.best_trial().unwrap();
    assert_eq!(best.state, TrialState::Complete);
    assert!(best.value.unwrap() <= 0.0);
}

#[test]
fn test_objective_error_is_returned_and_recorded() {
    let study = Study::builder().create().unwrap();
    let err = study
        .optimize(3, |_trial: &mut Trial| Err::<f64, _>("broken"))
        .unwrap_err();
    assert!(matches!(err, Error::TrialFailed { number: 0, ref message } if message == "broken"));
    assert_eq!(study.n_trials().unwrap(), 1);
}

#[test]
fn test_caught_errors_without_any_success() {
    let study = Study::builder().catch_failures(true).create().unwrap();
    let err = study
        .optimize(3, |_trial: &mut Trial| Err::<f64, _>("broken"))
        .unwrap_err();
    assert!(matches!(err, Error::NoCompletedTrials));
    assert_eq!(study.n_trials().unwrap(), 3);
}
