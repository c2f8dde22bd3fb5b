//! Exact conversion between the power and Bernstein coefficient layouts.
//!
//! Both directions are per-interval linear maps built from binomial
//! identities: the monomial `s^p` on an interval of width `w` expands over
//! the Bernstein basis of the same degree, and vice versa. Knots, trailing
//! shape, and the default extrapolation flag all carry over unchanged.

use ndarray::{ArrayD, IxDyn};

use crate::bernstein::BernsteinPiecewise;
use crate::evaluate::binom;
use crate::power::PowerPiecewise;
use crate::types::Extrapolate;

/// Re-express a power-basis store in the Bernstein basis.
///
/// Uses `(s / w)^p = sum_{j >= p} C(j, p) / C(K, p) * B_{j,K}(t)` per
/// monomial, where `K` is the shared degree and `t = s / w`.
pub fn to_bernstein(p: &PowerPiecewise) -> BernsteinPiecewise {
    let c = p.coefficients();
    let k = c.shape()[0];
    let m = c.shape()[1];
    let degree = k - 1;
    let trailing = &c.shape()[2..];
    let n_extra: usize = trailing.iter().product();
    let knots = p.knots();

    let mut shape = vec![k, m];
    shape.extend_from_slice(trailing);
    let mut out = ArrayD::zeros(IxDyn(&shape));
    {
        let mut o3 = out
            .view_mut()
            .into_shape_with_order((k, m, n_extra))
            .expect("freshly allocated tensor reshapes");
        let c3 = c
            .to_shape((k, m, n_extra))
            .expect("coefficient tensor reshapes to (order, intervals, slices)");
        for i in 0..m {
            let w = knots[i + 1] - knots[i];
            for a in 0..k {
                // Row a holds the coefficient of s^(degree - a).
                let power = degree - a;
                let w_pow = w.powi(power as i32);
                for q in 0..n_extra {
                    let scaled = c3[[a, i, q]] * w_pow / binom(degree, power);
                    if scaled == 0.0 {
                        continue;
                    }
                    for j in power..=degree {
                        o3[[j, i, q]] += scaled * binom(j, power);
                    }
                }
            }
        }
    }
    BernsteinPiecewise::construct_fast(
        out,
        knots.clone(),
        Extrapolate::from(p.extrapolates_by_default()),
    )
}

/// Re-express a Bernstein-basis store in the power basis.
///
/// Expands each basis function `B_{a,K}(s / w)` into monomials of `s`,
/// accumulating `C(K, a) * C(K - a, p - a) * (-1)^(p - a) / w^p` into the
/// coefficient of `s^p` for `p >= a`.
pub fn to_power(b: &BernsteinPiecewise) -> PowerPiecewise {
    let c = b.coefficients();
    let k = c.shape()[0];
    let m = c.shape()[1];
    let degree = k - 1;
    let trailing = &c.shape()[2..];
    let n_extra: usize = trailing.iter().product();
    let knots = b.knots();

    let mut shape = vec![k, m];
    shape.extend_from_slice(trailing);
    let mut out = ArrayD::zeros(IxDyn(&shape));
    {
        let mut o3 = out
            .view_mut()
            .into_shape_with_order((k, m, n_extra))
            .expect("freshly allocated tensor reshapes");
        let c3 = c
            .to_shape((k, m, n_extra))
            .expect("coefficient tensor reshapes to (order, intervals, slices)");
        for i in 0..m {
            let w = knots[i + 1] - knots[i];
            for a in 0..k {
                let lead = binom(degree, a);
                for q in 0..n_extra {
                    let value = c3[[a, i, q]];
                    if value == 0.0 {
                        continue;
                    }
                    for p in a..=degree {
                        let sign = if (p - a) % 2 == 0 { 1.0 } else { -1.0 };
                        o3[[degree - p, i, q]] +=
                            value * lead * binom(degree - a, p - a) * sign / w.powi(p as i32);
                    }
                }
            }
        }
    }
    PowerPiecewise::construct_fast(
        out,
        knots.clone(),
        Extrapolate::from(b.extrapolates_by_default()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn scalar(a: ArrayD<f64>) -> f64 {
        assert_eq!(a.len(), 1, "expected a scalar-valued result");
        a.into_iter().next().unwrap()
    }

    #[test]
    fn test_linear_bernstein_to_power() {
        // Controls [3, 1] on [0, 1] are 3 - 2s.
        let b = BernsteinPiecewise::new(
            array![[3.0], [1.0]].into_dyn(),
            array![0.0, 1.0],
            Extrapolate::Always,
        )
        .unwrap();
        let p = to_power(&b);
        let pc = p
            .coefficients()
            .clone()
            .into_dimensionality::<ndarray::Ix2>()
            .unwrap();
        assert_abs_diff_eq!(pc[[0, 0]], -2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(pc[[1, 0]], 3.0, epsilon = 1e-14);
    }

    #[test]
    fn test_round_trip_on_nonunit_intervals() {
        let p = PowerPiecewise::new(
            array![[1.5, -0.25], [0.0, 2.0], [-3.0, 0.5]].into_dyn(),
            array![-1.0, 0.5, 3.0],
            Extrapolate::Never,
        )
        .unwrap();
        let back = to_power(&to_bernstein(&p));
        assert!(!back.extrapolates_by_default());
        for &x in &[-1.0, -0.3, 0.5, 1.7, 3.0] {
            assert_abs_diff_eq!(
                scalar(back.evaluate_at(x, 0, Extrapolate::Always)),
                scalar(p.evaluate_at(x, 0, Extrapolate::Always)),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_conversion_agrees_pointwise() {
        let p = PowerPiecewise::new(
            array![[2.0, -1.0], [1.0, 0.5], [0.0, 4.0], [1.0, -2.0]].into_dyn(),
            array![0.0, 2.0, 2.5],
            Extrapolate::Always,
        )
        .unwrap();
        let b = to_bernstein(&p);
        for i in 0..=20 {
            let x = i as f64 * 0.125;
            assert_abs_diff_eq!(
                scalar(b.evaluate_at(x, 0, Extrapolate::Always)),
                scalar(p.evaluate_at(x, 0, Extrapolate::Always)),
                epsilon = 1e-11
            );
        }
    }
}
