use approx::assert_abs_diff_eq;
use ndarray::{Array1, ArrayD, IxDyn, array};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pwpoly::{Extrapolate, PowerPiecewise, Root};

fn scalar(a: ArrayD<f64>) -> f64 {
    assert_eq!(a.len(), 1, "expected a scalar-valued result");
    a.into_iter().next().unwrap()
}

#[test]
fn test_roots_simple_quadratics() {
    // (x - 0.25) on [0, 0.5), (x - 0.75) on [0.5, 1].
    let c = array![[1.0, 1.0], [-0.25, -0.25]].into_dyn();
    let p = PowerPiecewise::new(c, array![0.0, 0.5, 1.0], Extrapolate::Never).unwrap();
    let roots = p.roots(false, Extrapolate::Never).unwrap();
    assert_eq!(roots.len(), 1);
    let points: Vec<f64> = roots[0].iter().map(|r| r.point().unwrap()).collect();
    assert_eq!(points.len(), 2);
    assert_abs_diff_eq!(points[0], 0.25, epsilon = 1e-12);
    assert_abs_diff_eq!(points[1], 0.75, epsilon = 1e-12);
}

#[test]
fn test_roots_identically_zero_piece_reported_as_span() {
    // -s + 0.25 on [0, 0.4), zero on [0.4, 0.6), -s + 0.25 on [0.6, 1].
    let c = array![[-1.0, 0.0, -1.0], [0.25, 0.0, 0.25]].into_dyn();
    let p = PowerPiecewise::new(c, array![0.0, 0.4, 0.6, 1.0], Extrapolate::Never).unwrap();

    let roots = p.roots(false, Extrapolate::Never).unwrap();
    assert_eq!(roots[0].len(), 3);
    assert_abs_diff_eq!(roots[0][0].point().unwrap(), 0.25, epsilon = 1e-12);
    match roots[0][1] {
        Root::Span { start, end } => {
            assert_eq!(start, 0.4);
            assert_eq!(end, 0.6);
        }
        Root::Point(r) => panic!("expected a whole-interval root, got point {r}"),
    }
    assert_abs_diff_eq!(roots[0][2].point().unwrap(), 0.85, epsilon = 1e-12);
}

#[test]
fn test_roots_repeated_across_sections() {
    // (s^2 - 1) on [-1, 0) with s = x + 1, and -s^2 on [0, 1]: x = 0 is a
    // root of both pieces and is reported once.
    let c = array![[1.0, -1.0], [0.0, 0.0], [-1.0, 0.0]].into_dyn();
    let p = PowerPiecewise::new(c, array![-1.0, 0.0, 1.0], Extrapolate::Always).unwrap();

    let with_extrap: Vec<f64> = p
        .roots(false, Extrapolate::Always)
        .unwrap()
        .remove(0)
        .iter()
        .map(|r| r.point().unwrap())
        .collect();
    assert_eq!(with_extrap.len(), 2);
    assert_abs_diff_eq!(with_extrap[0], -2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(with_extrap[1], 0.0, epsilon = 1e-12);

    let without: Vec<f64> = p
        .roots(false, Extrapolate::Never)
        .unwrap()
        .remove(0)
        .iter()
        .map(|r| r.point().unwrap())
        .collect();
    assert_eq!(without.len(), 1);
    assert_abs_diff_eq!(without[0], 0.0, epsilon = 1e-12);
}

#[test]
fn test_roots_discontinuity_across_zero() {
    // Constant 1 then constant -1: no polynomial roots, but the jump at the
    // shared knot crosses zero.
    let c = array![[1.0, -1.0]].into_dyn();
    let p = PowerPiecewise::new(c, array![0.0, 0.5, 1.0], Extrapolate::Never).unwrap();

    assert!(p.roots(false, Extrapolate::Never).unwrap()[0].is_empty());
    let roots = p.roots(true, Extrapolate::Never).unwrap();
    assert_eq!(roots[0], vec![Root::Point(0.5)]);
}

#[test]
fn test_roots_extrapolated_beyond_last_interval() {
    // x - 2 on a domain ending at 1: the root exists only by extrapolation.
    let c = array![[1.0], [-2.0]].into_dyn();
    let p = PowerPiecewise::new(c, array![0.0, 1.0], Extrapolate::Always).unwrap();

    assert!(p.roots(false, Extrapolate::Never).unwrap()[0].is_empty());
    let roots = p.roots(false, Extrapolate::Always).unwrap();
    assert_abs_diff_eq!(roots[0][0].point().unwrap(), 2.0, epsilon = 1e-12);
}

#[test]
fn test_roots_are_ascending_and_satisfy_residual() {
    // Exercises every solver branch: linear, quadratic, cubic, companion.
    let mut rng = StdRng::seed_from_u64(1234);
    for k in 2..=9 {
        let knots: Vec<f64> = vec![0.0, 0.3, 0.9, 1.4, 2.0];
        let c = ArrayD::from_shape_fn(IxDyn(&[k, 4, 3]), |_| rng.random_range(-1.0..1.0));
        let p = PowerPiecewise::new(c, Array1::from(knots), Extrapolate::Never).unwrap();

        let all_roots = p.roots(false, Extrapolate::Never).unwrap();
        assert_eq!(all_roots.len(), 3);
        for (q, slice_roots) in all_roots.iter().enumerate() {
            let mut last = f64::NEG_INFINITY;
            for root in slice_roots {
                let r = root.point().expect("random coefficients produce no spans");
                assert!(r >= last, "roots must ascend");
                last = r;
                let values = p.evaluate_at(r, 0, Extrapolate::Never);
                assert!(
                    values[[q]].abs() < 1e-7,
                    "order {} residual {} at root {r} of slice {q}",
                    k - 1,
                    values[[q]]
                );
            }
        }
    }
}

#[test]
fn test_roots_of_derivative_locate_extrema() {
    // x^3 - 3x on one interval: derivative roots at +-1.
    let c = array![[1.0], [0.0], [-3.0], [0.0]].into_dyn();
    let p = PowerPiecewise::new(c, array![-2.0, 2.0], Extrapolate::Never).unwrap();
    let d = p.derivative(1);
    let roots = d.roots(false, Extrapolate::Never).unwrap();
    let points: Vec<f64> = roots[0].iter().map(|r| r.point().unwrap()).collect();
    assert_eq!(points.len(), 2);
    assert_abs_diff_eq!(points[0], -1.0, epsilon = 1e-10);
    assert_abs_diff_eq!(points[1], 1.0, epsilon = 1e-10);
    for &r in &points {
        assert_abs_diff_eq!(scalar(d.evaluate_at(r, 0, Extrapolate::Never)), 0.0, epsilon = 1e-10);
    }
}
