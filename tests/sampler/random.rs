use paramtune::distribution::{Distribution, FloatDistribution, IntDistribution};
use paramtune::sampler::{RandomSampler, Sampler};
use paramtune::{Direction, ParamValue};

fn float(low: f64, high: f64, log_scale: bool, step: Option<f64>) -> Distribution {
    Distribution::Float(FloatDistribution {
        low,
        high,
        log_scale,
        step,
    })
}

#[test]
fn test_random_float_in_bounds() {
    let sampler = RandomSampler::with_seed(1);
    let dist = float(-2.0, 3.0, false, None);
    for _ in 0..1000 {
        let v = sampler.sample(&dist, "x", Direction::Minimize, &[]);
        assert!(matches!(v, ParamValue::Float(x) if (-2.0..=3.0).contains(&x)));
    }
}

#[test]
fn test_random_log_float_in_bounds() {
    let sampler = RandomSampler::with_seed(2);
    let dist = float(1e-4, 1.0, true, None);
    let mut below_hundredth = 0;
    for _ in 0..1000 {
        let ParamValue::Float(x) = sampler.sample(&dist, "lr", Direction::Minimize, &[]) else {
            panic!("float distribution returned an int");
        };
        assert!((1e-4..=1.0).contains(&x));
        if x < 0.01 {
            below_hundredth += 1;
        }
    }
    // Half the log range lies below 0.01.
    assert!(below_hundredth > 350, "{below_hundredth}");
}

#[test]
fn test_random_stepped_float_on_grid() {
    let sampler = RandomSampler::with_seed(3);
    let dist = float(0.0, 1.0, false, Some(0.25));
    for _ in 0..200 {
        let ParamValue::Float(x) = sampler.sample(&dist, "x", Direction::Minimize, &[]) else {
            panic!("float distribution returned an int");
        };
        assert!([0.0, 0.25, 0.5, 0.75, 1.0].contains(&x), "{x}");
    }
}

#[test]
fn test_random_int_covers_range() {
    let sampler = RandomSampler::with_seed(4);
    let dist = Distribution::Int(IntDistribution {
        low: 1,
        high: 4,
        log_scale: false,
        step: None,
    });
    let mut seen = [false; 4];
    for _ in 0..500 {
        let ParamValue::Int(n) = sampler.sample(&dist, "n", Direction::Minimize, &[]) else {
            panic!("int distribution returned a float");
        };
        assert!((1..=4).contains(&n));
        seen[usize::try_from(n - 1).unwrap()] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_random_seed_is_reproducible() {
    let dist = float(0.0, 1.0, false, None);
    let a = RandomSampler::with_seed(99);
    let b = RandomSampler::with_seed(99);
    for _ in 0..20 {
        assert_eq!(
            a.sample(&dist, "x", Direction::Minimize, &[]),
            b.sample(&dist, "x", Direction::Minimize, &[])
        );
    }
}
