//! Per-interval real root extraction and the complex companion-matrix solver.
//!
//! Each interval's polynomial is solved in its local coordinate: closed-form
//! formulas up to degree 3, companion-matrix eigenvalues from degree 4 on.
//! Per-interval root sets are merged in ascending order, with roots landing
//! on a shared knot reported once and identically-zero pieces reported as an
//! explicit [`Root::Span`].

use ndarray::{Array2, ArrayView3};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::evaluate::eval_power_local;
use crate::faer_ndarray::FaerEigenvalues;
use crate::types::{PolyError, Root};

/// An eigenvalue counts as a real root when its imaginary part is this far
/// (relative to the real part) from zero.
const REAL_IMAG_TOL: f64 = 1e-10;

/// Tolerance for snapping near-boundary local roots onto the interval edge,
/// scaled by the interval width.
const BOUNDARY_TOL: f64 = 1e-9;

/// Two reported roots closer than this (relative) are the same root seen
/// from both sides of a shared knot.
const DEDUP_TOL: f64 = 1e-9;

/// Trailing-slice count above which root extraction fans out to rayon.
const PARALLEL_SLICES_MIN: usize = 4;

/// All complex roots of a polynomial given by descending power-basis
/// coefficients.
///
/// Leading zero coefficients are trimmed first. A degree-0 (or empty)
/// polynomial has no roots; that degenerate case yields a single NaN entry
/// rather than an error so batch callers can process columns uniformly.
pub fn complex_roots(coefficients: &[f64]) -> Result<Vec<Complex64>, PolyError> {
    let lead = coefficients.iter().position(|&v| v != 0.0);
    let trimmed = match lead {
        Some(l) => &coefficients[l..],
        None => &[],
    };
    if trimmed.len() <= 1 {
        return Ok(vec![Complex64::new(f64::NAN, f64::NAN)]);
    }
    match trimmed.len() {
        2 => Ok(vec![Complex64::new(-trimmed[1] / trimmed[0], 0.0)]),
        3 => Ok(quadratic_complex_roots(trimmed[0], trimmed[1], trimmed[2]).to_vec()),
        _ => companion_eigenvalues(trimmed),
    }
}

fn quadratic_complex_roots(a: f64, b: f64, c: f64) -> [Complex64; 2] {
    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        let [r0, r1] = quadratic_real_roots(a, b, c, disc);
        [Complex64::new(r0, 0.0), Complex64::new(r1, 0.0)]
    } else {
        let re = -b / (2.0 * a);
        let im = (-disc).sqrt() / (2.0 * a);
        [Complex64::new(re, -im.abs()), Complex64::new(re, im.abs())]
    }
}

/// Numerically stable quadratic formula for a known non-negative
/// discriminant: the larger-magnitude root comes from the `-(b + sign(b)
/// sqrt)` form, the other from the product of roots.
fn quadratic_real_roots(a: f64, b: f64, c: f64, disc: f64) -> [f64; 2] {
    if b == 0.0 {
        let r = disc.sqrt() / (2.0 * a);
        return [-r.abs(), r.abs()];
    }
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    [q / a, c / q]
}

/// Real roots of a cubic via the depressed form: Cardano's single-root
/// formula for positive discriminant, the trigonometric three-root branch
/// for negative.
fn cubic_real_roots(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let shift = -b / 3.0;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;

    if p == 0.0 && q == 0.0 {
        return vec![shift];
    }
    let disc = 0.25 * q * q + p * p * p / 27.0;
    if disc > 0.0 {
        let sq = disc.sqrt();
        let u = (-0.5 * q + sq).cbrt();
        let v = (-0.5 * q - sq).cbrt();
        vec![u + v + shift]
    } else if disc == 0.0 {
        // A simple root plus a double root.
        vec![3.0 * q / p + shift, -1.5 * q / p + shift]
    } else {
        let r = (-p / 3.0).sqrt();
        let phi = (3.0 * q / (2.0 * p) * (-3.0 / p).sqrt()).clamp(-1.0, 1.0).acos();
        (0..3)
            .map(|k| 2.0 * r * (phi / 3.0 - 2.0 * std::f64::consts::PI * k as f64 / 3.0).cos() + shift)
            .collect()
    }
}

/// Eigenvalues of the companion matrix of a monic-normalized polynomial,
/// given by descending coefficients with a nonzero leading entry.
fn companion_eigenvalues(cs: &[f64]) -> Result<Vec<Complex64>, PolyError> {
    let d = cs.len() - 1;
    let lead = cs[0];
    let mut companion = Array2::<f64>::zeros((d, d));
    for i in 0..d {
        // Row i, last column holds the negated coefficient of s^i.
        companion[[i, d - 1]] = -cs[d - i] / lead;
        if i + 1 < d {
            companion[[i + 1, i]] = 1.0;
        }
    }
    Ok(companion.complex_eigenvalues()?)
}

/// Real roots of one trimmed local polynomial (descending coefficients,
/// nonzero leading entry, degree at least 1).
fn local_real_roots(cs: &[f64]) -> Result<Vec<f64>, PolyError> {
    match cs.len() {
        2 => Ok(vec![-cs[1] / cs[0]]),
        3 => {
            let disc = cs[1] * cs[1] - 4.0 * cs[0] * cs[2];
            if disc < 0.0 {
                Ok(Vec::new())
            } else {
                Ok(quadratic_real_roots(cs[0], cs[1], cs[2], disc).to_vec())
            }
        }
        4 => Ok(cubic_real_roots(cs[0], cs[1], cs[2], cs[3])),
        _ => {
            let eigs = companion_eigenvalues(cs)?;
            Ok(eigs
                .into_iter()
                .filter(|z| z.im.abs() <= REAL_IMAG_TOL * z.re.abs().max(1.0))
                .map(|z| z.re)
                .collect())
        }
    }
}

fn push_dedup(out: &mut Vec<Root>, candidate: f64) {
    match out.last().copied() {
        Some(Root::Point(last)) if (candidate - last).abs() <= DEDUP_TOL * last.abs().max(1.0) => {}
        Some(Root::Span { end, .. }) if (candidate - end).abs() <= DEDUP_TOL * end.abs().max(1.0) => {}
        _ => out.push(Root::Point(candidate)),
    }
}

/// Ascending, deduplicated root sequence for one trailing slice.
fn slice_roots(
    c3: &ArrayView3<'_, f64>,
    knots: &[f64],
    q: usize,
    discontinuity: bool,
    extrapolate: bool,
) -> Result<Vec<Root>, PolyError> {
    let k = c3.shape()[0];
    let m = c3.shape()[1];
    let mut out = Vec::new();
    let mut prev: Option<(Vec<f64>, f64)> = None;

    for i in 0..m {
        let w = knots[i + 1] - knots[i];
        let col: Vec<f64> = (0..k).map(|j| c3[[j, i, q]]).collect();

        if discontinuity && i > 0 {
            let (prev_col, prev_w) = prev.as_ref().expect("previous interval recorded");
            let left = eval_power_local(ndarray::ArrayView1::from(prev_col), *prev_w, 0);
            let right = col[k - 1];
            if left.is_finite() && right.is_finite() && left * right < 0.0 {
                push_dedup(&mut out, knots[i]);
            }
        }

        match col.iter().position(|&v| v != 0.0) {
            None => {
                log::debug!(
                    "piece {i} is identically zero on [{}, {}]; reporting whole-interval root",
                    knots[i],
                    knots[i + 1]
                );
                out.push(Root::Span {
                    start: knots[i],
                    end: knots[i + 1],
                });
            }
            Some(lead) if lead + 1 == col.len() => {
                // Nonzero constant piece: no roots.
            }
            Some(lead) => {
                let mut locals = local_real_roots(&col[lead..])?;
                locals.retain(|s| s.is_finite());
                locals.sort_by(|a, b| a.partial_cmp(b).expect("finite roots compare"));
                let snap = BOUNDARY_TOL * w.max(1.0);
                for mut s in locals {
                    if s.abs() <= snap {
                        s = 0.0;
                    } else if (s - w).abs() <= snap {
                        s = w;
                    }
                    let below_ok = s >= 0.0 || (i == 0 && extrapolate);
                    let above_ok = if i + 1 == m {
                        extrapolate || s <= w
                    } else {
                        s <= w
                    };
                    if below_ok && above_ok {
                        push_dedup(&mut out, knots[i] + s);
                    }
                }
            }
        }
        prev = Some((col, w));
    }
    Ok(out)
}

/// Root extraction over every trailing slice of a power-basis coefficient
/// tensor viewed as `(k, m, n_extra)`. Slices are independent and solved in
/// parallel when there are enough of them.
pub(crate) fn real_roots(
    c3: &ArrayView3<'_, f64>,
    knots: &[f64],
    discontinuity: bool,
    extrapolate: bool,
) -> Result<Vec<Vec<Root>>, PolyError> {
    let n_extra = c3.shape()[2];
    if n_extra >= PARALLEL_SLICES_MIN {
        (0..n_extra)
            .into_par_iter()
            .map(|q| slice_roots(c3, knots, q, discontinuity, extrapolate))
            .collect()
    } else {
        (0..n_extra)
            .map(|q| slice_roots(c3, knots, q, discontinuity, extrapolate))
            .collect()
    }
}
