//! Local-polynomial evaluation kernels and the broadcasted evaluation driver.
//!
//! Both store variants funnel their evaluation through [`evaluate_broadcast`]:
//! the coefficient tensor is viewed as `(k, m, n_extra)` with all trailing
//! value axes flattened, each query point is located and evaluated against
//! every trailing slice, and the result is reshaped to
//! `query shape + trailing shape`.

use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayD, ArrayView1, ArrayView3, ArrayViewMut1, Axis, IxDyn, s};

use crate::interval::locate;

/// Minimum amount of per-call work (points x slices x order) before the
/// evaluation loop is handed to the rayon pool.
const PARALLEL_EVAL_MIN_WORK: usize = 16 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BasisKind {
    Power,
    Bernstein,
}

/// `deg * (deg - 1) * ... * (deg - nu + 1)`, the Horner prefactor for the
/// `nu`-th analytic derivative of a power-basis term of degree `deg`.
pub(crate) fn falling_factorial(deg: usize, nu: usize) -> f64 {
    let mut f = 1.0;
    for i in 0..nu {
        f *= (deg - i) as f64;
    }
    f
}

/// Binomial coefficient as a float, multiplicative form.
pub(crate) fn binom(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut r = 1.0;
    for i in 0..k {
        r = r * (n - i) as f64 / (i + 1) as f64;
    }
    r
}

/// Rising factorial `a * (a + 1) * ... * (a + m - 1)`.
pub(crate) fn pochhammer(a: f64, m: usize) -> f64 {
    let mut r = 1.0;
    for i in 0..m {
        r *= a + i as f64;
    }
    r
}

/// Horner evaluation of one power-basis coefficient column at local offset
/// `s`, analytically differentiated `nu` times. Coefficients are ordered
/// from degree `k-1` down to degree 0.
pub(crate) fn eval_power_local(cs: ArrayView1<'_, f64>, s: f64, nu: usize) -> f64 {
    let k = cs.len();
    if nu >= k {
        return 0.0;
    }
    let mut res = 0.0;
    for j in 0..k - nu {
        res = res * s + cs[j] * falling_factorial(k - 1 - j, nu);
    }
    res
}

/// De Casteljau evaluation of one Bernstein coefficient column at normalized
/// local coordinate `t`, after `nu` finite-difference derivative steps scaled
/// by the interval width `w`. The scheme is exact algebra, so `t` outside
/// `[0, 1]` performs true extrapolation.
pub(crate) fn eval_bernstein_local(
    cs: ArrayView1<'_, f64>,
    t: f64,
    w: f64,
    nu: usize,
    scratch: &mut Vec<f64>,
) -> f64 {
    let k = cs.len();
    if nu >= k {
        return 0.0;
    }
    scratch.clear();
    scratch.extend(cs.iter());
    let mut len = k;
    for _ in 0..nu {
        let degree = (len - 1) as f64;
        for a in 0..len - 1 {
            scratch[a] = degree * (scratch[a + 1] - scratch[a]) / w;
        }
        len -= 1;
    }
    for round in 1..len {
        for a in 0..len - round {
            scratch[a] = scratch[a] * (1.0 - t) + scratch[a + 1] * t;
        }
    }
    scratch[0]
}

fn fill_row(
    c3: &ArrayView3<'_, f64>,
    knots: &[f64],
    x: f64,
    nu: usize,
    extrapolate: bool,
    kind: BasisKind,
    row: &mut ArrayViewMut1<'_, f64>,
    scratch: &mut Vec<f64>,
) {
    let Some(j) = locate(knots, x, extrapolate) else {
        row.fill(f64::NAN);
        return;
    };
    let n_extra = c3.shape()[2];
    match kind {
        BasisKind::Power => {
            let s = x - knots[j];
            for q in 0..n_extra {
                row[q] = eval_power_local(c3.slice(s![.., j, q]), s, nu);
            }
        }
        BasisKind::Bernstein => {
            let w = knots[j + 1] - knots[j];
            let t = (x - knots[j]) / w;
            for q in 0..n_extra {
                row[q] = eval_bernstein_local(c3.slice(s![.., j, q]), t, w, nu, scratch);
            }
        }
    }
}

/// Evaluate a coefficient tensor of shape `(k, m, ...extra)` over an
/// arbitrary-shaped query array. Output shape is `queries.shape()` followed
/// by the trailing value shape.
pub(crate) fn evaluate_broadcast(
    coefficients: &ArrayD<f64>,
    knots: &[f64],
    queries: &ArrayD<f64>,
    nu: usize,
    extrapolate: bool,
    kind: BasisKind,
) -> ArrayD<f64> {
    let k = coefficients.shape()[0];
    let m = coefficients.shape()[1];
    let trailing = &coefficients.shape()[2..];
    let n_extra: usize = trailing.iter().product();
    let c3 = coefficients
        .to_shape((k, m, n_extra))
        .expect("coefficient tensor reshapes to (order, intervals, slices)");
    let c3 = c3.view();

    let xs: Vec<f64> = queries.iter().copied().collect();
    let r = xs.len();
    let mut out = Array2::<f64>::zeros((r, n_extra));

    let work = r * n_extra * k;
    if work >= PARALLEL_EVAL_MIN_WORK {
        log::debug!("evaluating {r} query points across {n_extra} slices in parallel");
        out.axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(xs.par_iter())
            .for_each_init(Vec::new, |scratch, (mut row, &x)| {
                fill_row(&c3, knots, x, nu, extrapolate, kind, &mut row, scratch);
            });
    } else {
        let mut scratch = Vec::new();
        for (mut row, &x) in out.axis_iter_mut(Axis(0)).zip(xs.iter()) {
            fill_row(&c3, knots, x, nu, extrapolate, kind, &mut row, &mut scratch);
        }
    }

    let mut full_shape: Vec<usize> = queries.shape().to_vec();
    full_shape.extend_from_slice(trailing);
    out.into_shape_with_order(IxDyn(&full_shape))
        .expect("output reshapes to query shape + trailing shape")
}
