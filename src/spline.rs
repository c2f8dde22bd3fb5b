//! Construction of a power-basis store from a B-spline descriptor.
//!
//! The conversion evaluates the spline and its derivatives at every
//! breakpoint via de Boor recursions and writes the local Taylor
//! coefficients `S^(d)(x_i) / d!` straight into the power layout.

use ndarray::{Array1, Array2};

use crate::evaluate::falling_factorial;
use crate::power::PowerPiecewise;
use crate::types::{Extrapolate, PolyError};

/// A B-spline in knots/coefficients/degree form.
///
/// `knots` is the full non-decreasing knot vector (typically clamped, with
/// `degree + 1` repeats at each end) and `coefficients` holds one value per
/// basis function, so `knots.len() == coefficients.len() + degree + 1` for
/// an exactly-sized descriptor.
#[derive(Debug, Clone)]
pub struct SplineDescriptor {
    pub knots: Array1<f64>,
    pub coefficients: Array1<f64>,
    pub degree: usize,
}

impl PowerPiecewise {
    /// Convert a B-spline to its piecewise power-basis form.
    ///
    /// The store's knots are the spline's interior breakpoints
    /// `knots[degree ..= knots.len() - 1 - degree]`, which must be strictly
    /// increasing (repeated interior knots would make a derivative of the
    /// spline discontinuous, which the power layout cannot carry).
    pub fn from_spline(
        spline: &SplineDescriptor,
        extrapolate: Extrapolate,
    ) -> Result<Self, PolyError> {
        let k = spline.degree;
        let t = spline
            .knots
            .as_slice()
            .ok_or_else(|| PolyError::InvalidSpline("knot vector is not contiguous".into()))?;
        if t.len() < 2 * k + 2 {
            return Err(PolyError::InvalidSpline(format!(
                "degree {k} needs at least {} knots, got {}",
                2 * k + 2,
                t.len()
            )));
        }
        let n_basis = t.len() - k - 1;
        if spline.coefficients.len() < n_basis {
            return Err(PolyError::InvalidSpline(format!(
                "knot vector supports {n_basis} basis functions but only {} coefficients were given",
                spline.coefficients.len()
            )));
        }
        for i in 0..t.len() - 1 {
            if !(t[i] <= t[i + 1]) {
                return Err(PolyError::InvalidSpline(format!(
                    "knot vector must be non-decreasing, but knots[{i}] > knots[{}]",
                    i + 1
                )));
            }
        }
        let breakpoints = &t[k..t.len() - k];
        for i in 0..breakpoints.len() - 1 {
            if breakpoints[i] >= breakpoints[i + 1] {
                return Err(PolyError::InvalidSpline(
                    "interior knots must be strictly increasing".into(),
                ));
            }
        }

        let m = breakpoints.len() - 1;
        let mut cvals = Array2::<f64>::zeros((k + 1, m));

        // Differentiate the working spline k times, sampling the left
        // endpoint of every interval at each derivative order.
        let mut wt: Vec<f64> = t.to_vec();
        let mut wc: Vec<f64> = spline.coefficients.iter().take(n_basis).copied().collect();
        let mut wk = k;
        for d in 0..=k {
            let d_factorial = falling_factorial(d, d);
            for i in 0..m {
                cvals[[k - d, i]] = deboor_value(&wt, &wc, wk, breakpoints[i]) / d_factorial;
            }
            if d < k {
                spline_derivative(&mut wt, &mut wc, wk);
                wk -= 1;
            }
        }

        Ok(PowerPiecewise::construct_fast(
            cvals.into_dyn(),
            Array1::from(breakpoints.to_vec()),
            extrapolate,
        ))
    }
}

/// Replace the working spline with its derivative: degree drops by one, the
/// outermost knots fall away, and coefficients become scaled first
/// differences. Zero-width knot spans contribute zero.
fn spline_derivative(t: &mut Vec<f64>, c: &mut Vec<f64>, k: usize) {
    let n = c.len();
    let mut nc = Vec::with_capacity(n - 1);
    for j in 0..n - 1 {
        let denom = t[j + k + 1] - t[j + 1];
        if denom > 0.0 {
            nc.push(k as f64 * (c[j + 1] - c[j]) / denom);
        } else {
            nc.push(0.0);
        }
    }
    *c = nc;
    t.remove(t.len() - 1);
    t.remove(0);
}

/// De Boor evaluation of a B-spline of degree `k` at `x`, with the valid
/// domain's last span closed on the right.
fn deboor_value(t: &[f64], c: &[f64], k: usize, x: f64) -> f64 {
    let n = c.len();
    // Span index j with t[j] <= x < t[j+1], clamped into [k, n-1].
    let mut j = if x >= t[n] {
        n - 1
    } else if x <= t[k] {
        k
    } else {
        t.partition_point(|&v| v <= x) - 1
    };
    j = j.clamp(k, n - 1);
    // Skip empty spans at the right end of the domain.
    while j > k && t[j] >= t[j + 1] {
        j -= 1;
    }

    let mut d: Vec<f64> = (0..=k).map(|r| c[j - k + r]).collect();
    for r in 1..=k {
        for a in (r..=k).rev() {
            let i = j - k + a;
            let denom = t[i + k - r + 1] - t[i];
            let alpha = if denom > 0.0 { (x - t[i]) / denom } else { 0.0 };
            d[a] = (1.0 - alpha) * d[a - 1] + alpha * d[a];
        }
    }
    d[k]
}
