use std::sync::Arc;

use paramtune::storage::{MemoryStorage, Storage};
use paramtune::{Direction, Error, Study};

fn shared() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new())
}

#[test]
fn test_defaults() {
    let study = Study::builder().create().unwrap();
    assert_eq!(study.direction(), Direction::Minimize);
    assert!(study.name().starts_with("study-"));
    assert_eq!(study.n_trials().unwrap(), 0);
}

#[test]
fn test_duplicate_name_without_load_if_exists() {
    let storage = shared();
    Study::builder()
        .name("dup")
        .storage(Arc::clone(&storage))
        .create()
        .unwrap();
    let err = Study::builder()
        .name("dup")
        .storage(storage)
        .create()
        .unwrap_err();
    assert!(matches!(err, Error::DuplicatedStudy(name) if name == "dup"));
}

#[test]
fn test_load_if_exists_reuses_trials() {
    let storage = shared();
    let first = Study::builder()
        .name("opt_study")
        .maximize()
        .storage(Arc::clone(&storage))
        .load_if_exists(true)
        .create()
        .unwrap();
    let trial = first.ask().unwrap();
    first.complete_trial(trial, 5.0).unwrap();

    let second = Study::builder()
        .name("opt_study")
        .maximize()
        .storage(storage)
        .load_if_exists(true)
        .create()
        .unwrap();
    assert_eq!(second.id(), first.id());
    assert_eq!(second.best_value().unwrap(), 5.0);
}

#[test]
fn test_direction_mismatch_is_rejected() {
    let storage = shared();
    Study::builder()
        .name("dir")
        .maximize()
        .storage(Arc::clone(&storage))
        .create()
        .unwrap();

    let err = Study::builder()
        .name("dir")
        .minimize()
        .storage(storage)
        .load_if_exists(true)
        .create()
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DirectionMismatch {
            stored: Direction::Maximize,
            requested: Direction::Minimize,
            ..
        }
    ));
}

#[test]
fn test_load_missing_study() {
    let err = Study::load("ghost", shared(), paramtune::sampler::RandomSampler::new()).unwrap_err();
    assert!(matches!(err, Error::StudyNotFound(name) if name == "ghost"));
}
