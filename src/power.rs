//! Power-basis piecewise-polynomial store.
//!
//! Coefficients on interval `i` are local Taylor coefficients in the offset
//! `s = x - knots[i]`, ordered from the highest degree down to the constant
//! term, exactly the layout `evaluate` and the calculus transforms expect.

use ndarray::{Array1, ArrayD, Axis, IxDyn};

use crate::evaluate::{self, BasisKind};
use crate::extend;
use crate::roots;
use crate::types::{self, Extrapolate, PolyError, Root};

/// A piecewise polynomial in the power (local monomial) basis.
///
/// Owns a strictly increasing knot sequence of `m + 1` entries and a
/// coefficient tensor of shape `(k, m, ...extra)`: axis 0 holds the `k`
/// basis terms from degree `k-1` down to 0, axis 1 the `m` intervals, and
/// any trailing axes carry independent vector-valued polynomials sharing
/// the same knots.
#[derive(Debug, Clone)]
pub struct PowerPiecewise {
    coefficients: ArrayD<f64>,
    knots: Array1<f64>,
    extrapolate: bool,
}

impl PowerPiecewise {
    /// Validating constructor. Rejects non-increasing knots, rank-deficient
    /// coefficient tensors, and interval-count mismatches.
    pub fn new(
        coefficients: ArrayD<f64>,
        knots: Array1<f64>,
        extrapolate: Extrapolate,
    ) -> Result<Self, PolyError> {
        types::validate_layout(&coefficients, &knots)?;
        Ok(Self::construct_fast(coefficients, knots, extrapolate))
    }

    /// Fast construction path: trusts the caller and performs no validation.
    /// Any invariant violation is the caller's responsibility.
    pub fn construct_fast(
        coefficients: ArrayD<f64>,
        knots: Array1<f64>,
        extrapolate: Extrapolate,
    ) -> Self {
        Self {
            coefficients,
            knots,
            extrapolate: extrapolate.resolve(true),
        }
    }

    pub fn coefficients(&self) -> &ArrayD<f64> {
        &self.coefficients
    }

    pub fn knots(&self) -> &Array1<f64> {
        &self.knots
    }

    /// Local polynomial degree (`k - 1`).
    pub fn degree(&self) -> usize {
        self.coefficients.shape()[0] - 1
    }

    pub fn interval_count(&self) -> usize {
        self.coefficients.shape()[1]
    }

    /// Shape of the trailing value axes; empty for scalar-valued stores.
    pub fn trailing_shape(&self) -> &[usize] {
        &self.coefficients.shape()[2..]
    }

    pub fn extrapolates_by_default(&self) -> bool {
        self.extrapolate
    }

    /// Broadcasted evaluation of the `nu`-th derivative over an
    /// arbitrary-shaped query array. Output shape is the query shape
    /// followed by the trailing value shape; out-of-domain queries follow
    /// the resolved extrapolation policy (NaN under `Never`).
    pub fn evaluate(&self, queries: &ArrayD<f64>, nu: usize, extrapolate: Extrapolate) -> ArrayD<f64> {
        evaluate::evaluate_broadcast(
            &self.coefficients,
            self.knots_slice(),
            queries,
            nu,
            extrapolate.resolve(self.extrapolate),
            BasisKind::Power,
        )
    }

    /// Evaluate at a single point; the result carries the trailing value
    /// shape (0-dimensional for scalar-valued stores).
    pub fn evaluate_at(&self, x: f64, nu: usize, extrapolate: Extrapolate) -> ArrayD<f64> {
        let query = ArrayD::from_elem(IxDyn(&[]), x);
        self.evaluate(&query, nu, extrapolate)
    }

    /// New store representing the `n`-th derivative: same knots, order
    /// reduced by `n` (floored at the zero polynomial). The closed-form
    /// transform shifts each coefficient down by `n` slots and scales by
    /// the falling factorial of its degree.
    pub fn derivative(&self, n: usize) -> Self {
        if n == 0 {
            return self.clone();
        }
        let k = self.coefficients.shape()[0];
        let m = self.coefficients.shape()[1];
        if n >= k {
            let mut shape = vec![1, m];
            shape.extend_from_slice(self.trailing_shape());
            return Self {
                coefficients: ArrayD::zeros(IxDyn(&shape)),
                knots: self.knots.clone(),
                extrapolate: self.extrapolate,
            };
        }
        let mut shape = vec![k - n, m];
        shape.extend_from_slice(self.trailing_shape());
        let mut out = ArrayD::zeros(IxDyn(&shape));
        for j in 0..k - n {
            let factor = evaluate::falling_factorial(k - 1 - j, n);
            let mut dst = out.index_axis_mut(Axis(0), j);
            dst.assign(&self.coefficients.index_axis(Axis(0), j));
            dst.mapv_inplace(|v| v * factor);
        }
        Self {
            coefficients: out,
            knots: self.knots.clone(),
            extrapolate: self.extrapolate,
        }
    }

    /// New store representing the `n`-th antiderivative. Each interval's
    /// integration constant is chosen so the result is continuous across
    /// knots, accumulated left to right; consequently
    /// `derivative(antiderivative(p, n), n) == p` up to floating error.
    pub fn antiderivative(&self, n: usize) -> Self {
        let mut out = self.clone();
        for _ in 0..n {
            out = out.antiderivative_once();
        }
        out
    }

    fn antiderivative_once(&self) -> Self {
        let k = self.coefficients.shape()[0];
        let m = self.coefficients.shape()[1];
        let trailing = self.trailing_shape().to_vec();
        let n_extra: usize = trailing.iter().product();

        let mut shape = vec![k + 1, m];
        shape.extend_from_slice(&trailing);
        let mut out = ArrayD::zeros(IxDyn(&shape));
        for j in 0..k {
            let divisor = (k - j) as f64;
            let mut dst = out.index_axis_mut(Axis(0), j);
            dst.assign(&self.coefficients.index_axis(Axis(0), j));
            dst.mapv_inplace(|v| v / divisor);
        }

        // The constant-term row is the running integral so far; intervals
        // must be visited in knot order.
        let mut o3 = out
            .view_mut()
            .into_shape_with_order((k + 1, m, n_extra))
            .expect("freshly allocated tensor reshapes");
        let mut offsets = vec![0.0; n_extra];
        for i in 0..m {
            let w = self.knots[i + 1] - self.knots[i];
            for (q, offset) in offsets.iter_mut().enumerate() {
                o3[[k, i, q]] = *offset;
                let mut value = 0.0;
                for j in 0..=k {
                    value = value * w + o3[[j, i, q]];
                }
                *offset = value;
            }
        }
        drop(o3);

        Self {
            coefficients: out,
            knots: self.knots.clone(),
            extrapolate: self.extrapolate,
        }
    }

    /// Definite integral `F(b) - F(a)` over each trailing slice, where `F`
    /// is the continuous antiderivative. The sign flips when `a > b`. Under
    /// a resolved Never-extrapolate policy, any bound outside the knot
    /// range makes the whole result NaN.
    pub fn integrate(&self, a: f64, b: f64, extrapolate: Extrapolate) -> ArrayD<f64> {
        let extrap = extrapolate.resolve(self.extrapolate);
        let (lo, hi, sign) = if a <= b { (a, b, 1.0) } else { (b, a, -1.0) };
        if !extrap
            && (!lo.is_finite()
                || !hi.is_finite()
                || lo < self.knots[0]
                || hi > self.knots[self.knots.len() - 1])
        {
            return ArrayD::from_elem(IxDyn(self.trailing_shape()), f64::NAN);
        }
        let f = self.antiderivative(1);
        let mut result = f.evaluate_at(hi, 0, Extrapolate::Always)
            - f.evaluate_at(lo, 0, Extrapolate::Always);
        if sign < 0.0 {
            result.mapv_inplace(|v| -v);
        }
        result
    }

    /// Real roots of every trailing slice, each as an ascending,
    /// deduplicated sequence ordered row-major over the trailing axes
    /// (scalar-valued stores yield a single sequence).
    ///
    /// With `discontinuity` set, a sign change across a knot is reported as
    /// a root at that knot. Identically-zero pieces appear as
    /// [`Root::Span`] entries.
    pub fn roots(
        &self,
        discontinuity: bool,
        extrapolate: Extrapolate,
    ) -> Result<Vec<Vec<Root>>, PolyError> {
        let k = self.coefficients.shape()[0];
        let m = self.coefficients.shape()[1];
        let n_extra: usize = self.trailing_shape().iter().product();
        let c3 = self
            .coefficients
            .to_shape((k, m, n_extra))
            .expect("coefficient tensor reshapes to (order, intervals, slices)");
        roots::real_roots(
            &c3.view(),
            self.knots_slice(),
            discontinuity,
            extrapolate.resolve(self.extrapolate),
        )
    }

    /// Append (or prepend) intervals in place. `knots` lists the new
    /// interval boundaries past the current end, one coefficient column
    /// per knot; differing polynomial orders are reconciled by zero-padding
    /// the lower-order side at its highest-degree slot.
    pub fn extend(
        &mut self,
        coefficients: ArrayD<f64>,
        knots: Array1<f64>,
        append_right: bool,
    ) -> Result<(), PolyError> {
        let (merged_c, merged_x) = extend::splice(
            &self.coefficients,
            &self.knots,
            &coefficients,
            &knots,
            append_right,
        )?;
        self.coefficients = merged_c;
        self.knots = merged_x;
        Ok(())
    }

    fn knots_slice(&self) -> &[f64] {
        self.knots
            .as_slice()
            .expect("owned knot sequence is contiguous")
    }
}
