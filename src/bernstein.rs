//! Bernstein-basis piecewise-polynomial store and Hermite construction.
//!
//! Coefficients on interval `i` are control values for the Bernstein basis
//! over the normalized coordinate `t = (x - knots[i]) / w`. The basis makes
//! endpoint derivatives linear in a short prefix/suffix of the coefficient
//! column, which is what the two-sided Hermite construction exploits.

use ndarray::{Array1, Array2, ArrayD, IxDyn};

use crate::convert;
use crate::evaluate::{self, BasisKind, binom, pochhammer};
use crate::extend;
use crate::types::{self, Extrapolate, PolyError, Root};

/// Target polynomial order selector for [`BernsteinPiecewise::from_derivatives`].
///
/// `Global(o)` caps every interval at polynomial order `o`;
/// `PerInterval` prescribes one order per interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orders {
    Global(usize),
    PerInterval(Vec<usize>),
}

impl Orders {
    fn for_interval(&self, i: usize) -> usize {
        match self {
            Orders::Global(o) => *o,
            Orders::PerInterval(v) => v[i],
        }
    }
}

/// A piecewise polynomial in the Bernstein basis.
///
/// Layout matches [`crate::power::PowerPiecewise`]: coefficient tensor of
/// shape `(k, m, ...extra)` over `m + 1` strictly increasing knots, with
/// axis 0 holding the `k` control values of a degree `k - 1` Bernstein
/// expansion per interval.
#[derive(Debug, Clone)]
pub struct BernsteinPiecewise {
    coefficients: ArrayD<f64>,
    knots: Array1<f64>,
    extrapolate: bool,
}

impl BernsteinPiecewise {
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
    /// arbitrary-shaped query array. De Casteljau is exact algebra, so
    /// queries outside the domain extrapolate with the boundary piece when
    /// the resolved policy allows and yield NaN otherwise.
    pub fn evaluate(&self, queries: &ArrayD<f64>, nu: usize, extrapolate: Extrapolate) -> ArrayD<f64> {
        evaluate::evaluate_broadcast(
            &self.coefficients,
            self.knots_slice(),
            queries,
            nu,
            extrapolate.resolve(self.extrapolate),
            BasisKind::Bernstein,
        )
    }

    /// Evaluate at a single point; the result carries the trailing value
    /// shape (0-dimensional for scalar-valued stores).
    pub fn evaluate_at(&self, x: f64, nu: usize, extrapolate: Extrapolate) -> ArrayD<f64> {
        let query = ArrayD::from_elem(IxDyn(&[]), x);
        self.evaluate(&query, nu, extrapolate)
    }

    /// New store representing the `n`-th derivative. Each step is the
    /// finite-difference transform `(k-1) * (c[a+1] - c[a]) / w`, floored at
    /// the zero polynomial once the order is exhausted.
    pub fn derivative(&self, n: usize) -> Self {
        let mut out = self.clone();
        for _ in 0..n {
            out = out.derivative_once();
        }
        out
    }

    fn derivative_once(&self) -> Self {
        let k = self.coefficients.shape()[0];
        let m = self.coefficients.shape()[1];
        let trailing = self.trailing_shape().to_vec();
        let n_extra: usize = trailing.iter().product();

        if k == 1 {
            let mut shape = vec![1, m];
            shape.extend_from_slice(&trailing);
            return Self {
                coefficients: ArrayD::zeros(IxDyn(&shape)),
                knots: self.knots.clone(),
                extrapolate: self.extrapolate,
            };
        }

        let mut shape = vec![k - 1, m];
        shape.extend_from_slice(&trailing);
        let mut out = ArrayD::zeros(IxDyn(&shape));
        {
            let mut o3 = out
                .view_mut()
                .into_shape_with_order((k - 1, m, n_extra))
                .expect("freshly allocated tensor reshapes");
            let c3 = self
                .coefficients
                .to_shape((k, m, n_extra))
                .expect("coefficient tensor reshapes to (order, intervals, slices)");
            let degree = (k - 1) as f64;
            for i in 0..m {
                let w = self.knots[i + 1] - self.knots[i];
                for a in 0..k - 1 {
                    for q in 0..n_extra {
                        o3[[a, i, q]] = degree * (c3[[a + 1, i, q]] - c3[[a, i, q]]) / w;
                    }
                }
            }
        }
        Self {
            coefficients: out,
            knots: self.knots.clone(),
            extrapolate: self.extrapolate,
        }
    }

    /// New store representing the `n`-th antiderivative, with per-interval
    /// integration constants accumulated left to right so the result is
    /// continuous across knots.
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
        {
            let mut o3 = out
                .view_mut()
                .into_shape_with_order((k + 1, m, n_extra))
                .expect("freshly allocated tensor reshapes");
            let c3 = self
                .coefficients
                .to_shape((k, m, n_extra))
                .expect("coefficient tensor reshapes to (order, intervals, slices)");
            let mut offsets = vec![0.0; n_extra];
            for i in 0..m {
                let w = self.knots[i + 1] - self.knots[i];
                for (q, offset) in offsets.iter_mut().enumerate() {
                    o3[[0, i, q]] = *offset;
                    for a in 1..=k {
                        o3[[a, i, q]] = o3[[a - 1, i, q]] + c3[[a - 1, i, q]] * w / k as f64;
                    }
                    // The last control value is the antiderivative at the
                    // right knot, which seeds the next interval.
                    *offset = o3[[k, i, q]];
                }
            }
        }
        Self {
            coefficients: out,
            knots: self.knots.clone(),
            extrapolate: self.extrapolate,
        }
    }

    /// Definite integral `F(b) - F(a)` over each trailing slice. Sign flips
    /// when `a > b`; under a resolved Never-extrapolate policy any bound
    /// outside the knot range makes the whole result NaN.
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

    /// Real roots of every trailing slice, computed on the power-basis
    /// image of this store. See [`crate::power::PowerPiecewise::roots`].
    pub fn roots(
        &self,
        discontinuity: bool,
        extrapolate: Extrapolate,
    ) -> Result<Vec<Vec<Root>>, PolyError> {
        convert::to_power(self).roots(discontinuity, extrapolate)
    }

    /// Append (or prepend) intervals in place, reconciling differing orders
    /// by zero-padding the lower-order side at its leading slots.
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

    /// Re-express every interval in a Bernstein basis of degree `self.degree()
    /// + d` without changing the represented function.
    pub fn raise_degree(&self, d: usize) -> Self {
        if d == 0 {
            return self.clone();
        }
        let k = self.coefficients.shape()[0];
        let m = self.coefficients.shape()[1];
        let trailing = self.trailing_shape().to_vec();
        let n_extra: usize = trailing.iter().product();

        let mut shape = vec![k + d, m];
        shape.extend_from_slice(&trailing);
        let mut out = ArrayD::zeros(IxDyn(&shape));
        {
            let mut o3 = out
                .view_mut()
                .into_shape_with_order((k + d, m, n_extra))
                .expect("freshly allocated tensor reshapes");
            let c3 = self
                .coefficients
                .to_shape((k, m, n_extra))
                .expect("coefficient tensor reshapes to (order, intervals, slices)");
            let mut column = vec![0.0; k];
            for i in 0..m {
                for q in 0..n_extra {
                    for (a, slot) in column.iter_mut().enumerate() {
                        *slot = c3[[a, i, q]];
                    }
                    let raised = raise_degree_column(&column, d);
                    for (a, v) in raised.iter().enumerate() {
                        o3[[a, i, q]] = *v;
                    }
                }
            }
        }
        Self {
            coefficients: out,
            knots: self.knots.clone(),
            extrapolate: self.extrapolate,
        }
    }

    /// Hermite construction: build the piecewise polynomial matching the
    /// prescribed derivative values `yi[i] = [f(xi[i]), f'(xi[i]), ...]` at
    /// each knot.
    ///
    /// With `orders` unset, interval `i` uses all values from both of its
    /// endpoints. A prescribed order `o` fits `o + 1` coefficients per
    /// interval, drawing `ceil((o + 1) / 2)` values from the left endpoint
    /// and the remainder from the right, rebalancing toward whichever side
    /// has data when the other runs short. Intervals of differing order are
    /// degree-raised to the maximum so the store stays rectangular.
    pub fn from_derivatives(
        xi: &[f64],
        yi: &[Vec<f64>],
        orders: Option<&Orders>,
        extrapolate: Extrapolate,
    ) -> Result<Self, PolyError> {
        if xi.len() != yi.len() {
            return Err(PolyError::DerivativeDataLengthMismatch {
                xi: xi.len(),
                yi: yi.len(),
            });
        }
        if xi.len() < 2 {
            return Err(PolyError::TooFewHermiteKnots { provided: xi.len() });
        }
        for index in 0..xi.len() - 1 {
            // The negated comparison also rejects NaN knots.
            if !(xi[index] < xi[index + 1]) {
                return Err(PolyError::HermiteKnotsNotIncreasing { index });
            }
        }
        for (&x, y) in xi.iter().zip(yi) {
            if y.is_empty() {
                return Err(PolyError::EmptyDerivativeData { knot: x });
            }
        }
        let m = xi.len() - 1;
        if let Some(Orders::PerInterval(v)) = orders {
            if v.len() != m {
                return Err(PolyError::OrdersLengthMismatch {
                    expected: m,
                    provided: v.len(),
                });
            }
        }

        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(m);
        for i in 0..m {
            let ya = &yi[i];
            let yb = &yi[i + 1];
            let (n_left, n_right) = match orders {
                None => (ya.len(), yb.len()),
                Some(orders) => {
                    let order = orders.for_interval(i);
                    if order == 0 {
                        return Err(PolyError::OrdersNotPositive);
                    }
                    let n = order + 1;
                    let mut n_left = n.div_ceil(2).min(ya.len());
                    let n_right = (n - n_left).min(yb.len());
                    n_left = n - n_right;
                    if n_left > ya.len() || n_right > yb.len() {
                        return Err(PolyError::OrderExceedsData {
                            order,
                            left: xi[i],
                            right: xi[i + 1],
                            left_available: ya.len(),
                            right_available: yb.len(),
                        });
                    }
                    (n_left, n_right)
                }
            };
            columns.push(construct_from_derivatives(
                xi[i],
                xi[i + 1],
                &ya[..n_left],
                &yb[..n_right],
            ));
        }

        let k_target = columns.iter().map(Vec::len).max().unwrap_or(1);
        let mut c = Array2::<f64>::zeros((k_target, m));
        for (i, column) in columns.into_iter().enumerate() {
            let column = if column.len() < k_target {
                raise_degree_column(&column, k_target - column.len())
            } else {
                column
            };
            for (j, v) in column.into_iter().enumerate() {
                c[[j, i]] = v;
            }
        }
        Ok(Self::construct_fast(
            c.into_dyn(),
            Array1::from(xi.to_vec()),
            extrapolate,
        ))
    }

    fn knots_slice(&self) -> &[f64] {
        self.knots
            .as_slice()
            .expect("owned knot sequence is contiguous")
    }
}

/// Bernstein coefficients of the unique polynomial on `[xa, xb]` whose
/// derivatives at `xa` are `ya` and at `xb` are `yb`.
///
/// The endpoint-derivative structure of the basis makes the first
/// `ya.len()` coefficients a forward triangular solve and the last
/// `yb.len()` a backward one; the two never overlap.
pub(crate) fn construct_from_derivatives(xa: f64, xb: f64, ya: &[f64], yb: &[f64]) -> Vec<f64> {
    let na = ya.len();
    let nb = yb.len();
    let n = na + nb;
    let dx = xb - xa;
    let mut c = vec![0.0; n];
    for q in 0..na {
        c[q] = ya[q] / pochhammer((n - q) as f64, q) * dx.powi(q as i32);
        for j in 0..q {
            let sign = if (j + q) % 2 == 0 { 1.0 } else { -1.0 };
            c[q] -= sign * binom(q, j) * c[j];
        }
    }
    for q in 0..nb {
        let idx = n - 1 - q;
        let sign_q = if q % 2 == 0 { 1.0 } else { -1.0 };
        c[idx] = yb[q] / pochhammer((n - q) as f64, q) * sign_q * dx.powi(q as i32);
        for j in 0..q {
            let sign = if (j + 1) % 2 == 0 { 1.0 } else { -1.0 };
            c[idx] -= sign * binom(q, j + 1) * c[n - q + j];
        }
    }
    c
}

/// Control values of the same polynomial expressed in a Bernstein basis of
/// degree `c.len() - 1 + d`.
pub(crate) fn raise_degree_column(c: &[f64], d: usize) -> Vec<f64> {
    let k = c.len() - 1;
    let mut out = vec![0.0; c.len() + d];
    for (a, &value) in c.iter().enumerate() {
        let scaled = value * binom(k, a);
        for j in 0..=d {
            out[a + j] += scaled * binom(d, j) / binom(k + d, a + j);
        }
    }
    out
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
    fn test_constant_piece() {
        let b = BernsteinPiecewise::new(
            array![[3.0]].into_dyn(),
            array![0.0, 1.0],
            Extrapolate::InheritDefault,
        )
        .unwrap();
        assert_abs_diff_eq!(
            scalar(b.evaluate_at(0.1, 0, Extrapolate::InheritDefault)),
            3.0
        );
    }

    #[test]
    fn test_linear_and_quadratic_pieces() {
        let b = BernsteinPiecewise::new(
            array![[3.0], [1.0]].into_dyn(),
            array![0.0, 1.0],
            Extrapolate::Always,
        )
        .unwrap();
        assert_abs_diff_eq!(
            scalar(b.evaluate_at(0.1, 0, Extrapolate::Always)),
            3.0 * 0.9 + 1.0 * 0.1,
            epsilon = 1e-14
        );

        let b = BernsteinPiecewise::new(
            array![[3.0], [1.0], [4.0]].into_dyn(),
            array![0.0, 1.0],
            Extrapolate::Always,
        )
        .unwrap();
        let t = 0.2f64;
        let expected = 3.0 * (1.0 - t).powi(2) + 1.0 * 2.0 * t * (1.0 - t) + 4.0 * t * t;
        assert_abs_diff_eq!(
            scalar(b.evaluate_at(t, 0, Extrapolate::Always)),
            expected,
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_cubic_with_unit_lower_controls() {
        // Controls [1, 1, 1, 2] expand to 1 + t^3.
        let b = BernsteinPiecewise::new(
            array![[1.0], [1.0], [1.0], [2.0]].into_dyn(),
            array![0.0, 1.0],
            Extrapolate::Always,
        )
        .unwrap();
        assert_abs_diff_eq!(
            scalar(b.evaluate_at(0.3, 0, Extrapolate::Always)),
            1.0 + 0.3f64.powi(3),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_derivative_and_antiderivative_invert() {
        let b = BernsteinPiecewise::new(
            array![[1.0, 2.0], [4.0, 0.5], [2.0, 3.0]].into_dyn(),
            array![0.0, 0.5, 2.0],
            Extrapolate::Always,
        )
        .unwrap();
        let round = b.antiderivative(1).derivative(1);
        for &x in &[0.0, 0.2, 0.5, 1.3, 2.0] {
            assert_abs_diff_eq!(
                scalar(round.evaluate_at(x, 0, Extrapolate::Always)),
                scalar(b.evaluate_at(x, 0, Extrapolate::Always)),
                epsilon = 1e-12
            );
        }
        // The antiderivative is continuous at the interior knot.
        let f = b.antiderivative(1);
        assert_abs_diff_eq!(
            scalar(f.evaluate_at(0.5 - 1e-12, 0, Extrapolate::Always)),
            scalar(f.evaluate_at(0.5 + 1e-12, 0, Extrapolate::Always)),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_hermite_column_linear_and_quadratic() {
        assert_eq!(construct_from_derivatives(0.0, 1.0, &[2.0], &[3.0]), vec![2.0, 3.0]);

        let c = construct_from_derivatives(0.0, 1.0, &[1.0, 0.0], &[1.0]);
        for (got, want) in c.iter().zip([1.0, 1.0, 1.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-14);
        }

        let c = construct_from_derivatives(0.0, 1.0, &[2.0, 3.0], &[1.0]);
        for (got, want) in c.iter().zip([2.0, 3.5, 1.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-14);
        }

        let c = construct_from_derivatives(0.0, 1.0, &[2.0], &[1.0, 3.0]);
        for (got, want) in c.iter().zip([2.0, -0.5, 1.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_hermite_column_cubic() {
        let c = construct_from_derivatives(0.0, 1.0, &[1.0, 2.0, 3.0], &[4.0]);
        for (got, want) in c.iter().zip([1.0, 5.0 / 3.0, 17.0 / 6.0, 4.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-14);
        }

        let c = construct_from_derivatives(0.0, 1.0, &[1.0], &[4.0, 2.0, 3.0]);
        for (got, want) in c.iter().zip([1.0, 19.0 / 6.0, 10.0 / 3.0, 4.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-14);
        }

        let c = construct_from_derivatives(0.0, 1.0, &[1.0, 2.0], &[4.0, 3.0]);
        for (got, want) in c.iter().zip([1.0, 5.0 / 3.0, 3.0, 4.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_raise_degree_preserves_values() {
        let b = BernsteinPiecewise::new(
            array![[0.3], [1.7], [0.2], [2.4]].into_dyn(),
            array![0.0, 1.0],
            Extrapolate::Always,
        )
        .unwrap();
        let raised = b.raise_degree(5);
        assert_eq!(raised.degree(), 8);
        for i in 0..=10 {
            let x = i as f64 / 10.0;
            assert_abs_diff_eq!(
                scalar(raised.evaluate_at(x, 0, Extrapolate::Always)),
                scalar(b.evaluate_at(x, 0, Extrapolate::Always)),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_from_derivatives_mixed_counts_raise_degree() {
        let xi = [0.0, 1.0, 2.0, 3.0];
        let yi = vec![
            vec![0.0, 0.0],
            vec![0.0],
            vec![0.0, 0.0],
            vec![0.0, 0.0],
        ];
        let b = BernsteinPiecewise::from_derivatives(&xi, &yi, None, Extrapolate::Always).unwrap();
        assert_eq!(b.coefficients().shape(), &[4, 3]);
        let d = b.derivative(1);
        for &x in &[0.0, 0.1, 1.0, 1.1, 1.9, 2.0, 2.5] {
            assert_abs_diff_eq!(scalar(b.evaluate_at(x, 0, Extrapolate::Always)), 0.0);
            assert_abs_diff_eq!(scalar(d.evaluate_at(x, 0, Extrapolate::Always)), 0.0);
        }
    }

    #[test]
    fn test_from_derivatives_validation() {
        assert!(matches!(
            BernsteinPiecewise::from_derivatives(
                &[0.0, 1.0],
                &[vec![0.0]],
                None,
                Extrapolate::Always
            ),
            Err(PolyError::DerivativeDataLengthMismatch { xi: 2, yi: 1 })
        ));
        assert!(matches!(
            BernsteinPiecewise::from_derivatives(
                &[0.0, 0.0, 1.0],
                &[vec![0.0], vec![0.0], vec![0.0]],
                None,
                Extrapolate::Always
            ),
            Err(PolyError::HermiteKnotsNotIncreasing { index: 0 })
        ));
        assert!(matches!(
            BernsteinPiecewise::from_derivatives(
                &[0.0, 1.0],
                &[vec![1.0], vec![]],
                None,
                Extrapolate::Always
            ),
            Err(PolyError::EmptyDerivativeData { .. })
        ));
    }

    #[test]
    fn test_from_derivatives_order_bounds() {
        // Two derivative values per knot support orders up to 3, not 4.
        let xi = [0.0, 1.0, 2.0];
        let yi = vec![vec![1.0, 0.5], vec![2.0, -1.0], vec![0.0, 0.25]];
        assert!(BernsteinPiecewise::from_derivatives(
            &xi,
            &yi,
            Some(&Orders::Global(3)),
            Extrapolate::Always
        )
        .is_ok());
        assert!(matches!(
            BernsteinPiecewise::from_derivatives(
                &xi,
                &yi,
                Some(&Orders::Global(4)),
                Extrapolate::Always
            ),
            Err(PolyError::OrderExceedsData { order: 4, .. })
        ));
        assert!(matches!(
            BernsteinPiecewise::from_derivatives(
                &xi,
                &yi,
                Some(&Orders::PerInterval(vec![1])),
                Extrapolate::Always
            ),
            Err(PolyError::OrdersLengthMismatch { expected: 2, provided: 1 })
        ));
    }
}
