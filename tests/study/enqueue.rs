use std::collections::BTreeMap;

use paramtune::parameter::{FloatParam, IntParam, Parameter};
use paramtune::{ParamValue, Study};

#[test]
fn test_enqueued_params_are_used_in_order() {
    let study = Study::builder().create().unwrap();
    let x = FloatParam::new("x", 0.0, 10.0);

    study.enqueue(BTreeMap::from([("x".to_owned(), ParamValue::Float(1.0))]));
    study.enqueue(BTreeMap::from([("x".to_owned(), ParamValue::Float(2.0))]));
    assert_eq!(study.n_enqueued(), 2);

    let mut first = study.ask().unwrap();
    let mut second = study.ask().unwrap();
    assert_eq!(x.suggest(&mut first).unwrap(), 1.0);
    assert_eq!(x.suggest(&mut second).unwrap(), 2.0);
    assert_eq!(study.n_enqueued(), 0);
}

#[test]
fn test_partial_enqueue_samples_the_rest() {
    let study = Study::builder().create().unwrap();
    study.enqueue(BTreeMap::from([("n".to_owned(), ParamValue::Int(4))]));

    let mut trial = study.ask().unwrap();
    let n = IntParam::new("n", 0, 10).suggest(&mut trial).unwrap();
    let y = FloatParam::new("y", -1.0, 1.0).suggest(&mut trial).unwrap();
    assert_eq!(n, 4);
    assert!((-1.0..=1.0).contains(&y));
}

#[test]
fn test_integral_float_is_accepted_for_int_param() {
    let study = Study::builder().create().unwrap();
    study.enqueue(BTreeMap::from([("n".to_owned(), ParamValue::Float(7.0))]));

    let mut trial = study.ask().unwrap();
    assert_eq!(IntParam::new("n", 0, 10).suggest(&mut trial).unwrap(), 7);
}
