use paramtune::parameter::{FloatParam, IntParam, Parameter};
use paramtune::sampler::TpeSampler;
use paramtune::{Error, Study, Trial};

fn tpe(seed: u64) -> TpeSampler {
    TpeSampler::builder()
        .seed(seed)
        .n_startup_trials(10)
        .n_ei_candidates(24)
        .build()
        .unwrap()
}

#[test]
fn test_tpe_optimizes_quadratic_function() {
    let study = Study::builder().minimize().sampler(tpe(42)).create().unwrap();
    let x_param = FloatParam::new("x", -10.0, 10.0);

    study
        .optimize(60, |trial: &mut Trial| {
            let x = x_param.suggest(trial)?;
            Ok::<_, Error>((x - 3.0).powi(2))
        })
        .expect("optimization should succeed");

    let best = study.best_value().unwrap();
    assert!(best < 2.0, "best value {best} should be < 2.0");
}

#[test]
fn test_tpe_maximizes_integer_score() {
    let study = Study::builder().maximize().sampler(tpe(7)).create().unwrap();
    let n_param = IntParam::new("n", 0, 100);

    study
        .optimize(50, |trial: &mut Trial| {
            let n = n_param.suggest(trial)?;
            #[allow(clippy::cast_precision_loss)]
            let score = -((n - 70).abs() as f64);
            Ok::<_, Error>(score)
        })
        .unwrap();

    let best = study.best_value().unwrap();
    assert!(best >= -5.0, "best value {best} should be >= -5");
}

#[test]
fn test_tpe_with_fixed_seed_is_reproducible() {
    let run = || {
        let study = Study::builder().minimize().sampler(tpe(11)).create().unwrap();
        let x_param = FloatParam::new("x", -5.0, 5.0);
        study
            .optimize(25, |trial: &mut Trial| {
                let x = x_param.suggest(trial)?;
                Ok::<_, Error>(x * x)
            })
            .unwrap();
        study
            .trials()
            .unwrap()
            .into_iter()
            .map(|t| t.params["x"])
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_tpe_stays_in_bounds() {
    let study = Study::builder().minimize().sampler(tpe(5)).create().unwrap();
    let x_param = FloatParam::new("x", 0.0, 1.0).step(0.1);
    let lr_param = FloatParam::new("lr", 1e-5, 1e-1).log_scale();

    study
        .optimize(40, |trial: &mut Trial| {
            let x = x_param.suggest(trial)?;
            let lr = lr_param.suggest(trial)?;
            assert!((0.0..=1.0).contains(&x));
            assert!((1e-5..=1e-1).contains(&lr));
            Ok::<_, Error>(x + lr.ln().abs())
        })
        .unwrap();
}

#[test]
fn test_invalid_gamma_is_rejected() {
    let err = TpeSampler::builder().gamma(1.5).build().unwrap_err();
    assert!(matches!(err, Error::InvalidGamma(g) if g == 1.5));
}
