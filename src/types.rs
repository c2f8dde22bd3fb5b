use ndarray::{Array1, ArrayD};
use thiserror::Error;

use crate::faer_ndarray::LinalgError;

/// Out-of-domain evaluation policy.
///
/// Replaces the nullable-boolean convention (`true` / `false` / unspecified)
/// with an explicit three-valued selector. `InheritDefault` resolves to the
/// store's own default flag at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolate {
    /// Evaluate out-of-domain points with the boundary interval's polynomial.
    Always,
    /// Out-of-domain points yield NaN in the output.
    Never,
    /// Use the store's default extrapolation flag.
    #[default]
    InheritDefault,
}

impl Extrapolate {
    /// Resolve the tri-state against a store's default flag.
    pub fn resolve(self, default: bool) -> bool {
        match self {
            Extrapolate::Always => true,
            Extrapolate::Never => false,
            Extrapolate::InheritDefault => default,
        }
    }
}

impl From<bool> for Extrapolate {
    fn from(flag: bool) -> Self {
        if flag {
            Extrapolate::Always
        } else {
            Extrapolate::Never
        }
    }
}

/// One entry of an ascending root sequence.
///
/// A polynomial piece that is identically zero makes every point of its
/// interval a root. That case is reported as an explicit `Span` variant
/// inserted at its position in the sequence, rather than overloading a NaN
/// placeholder between ordinary roots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Root {
    /// An isolated real root.
    Point(f64),
    /// The polynomial is identically zero on `[start, end]`.
    Span { start: f64, end: f64 },
}

impl Root {
    /// The isolated root location, or `None` for a whole-interval span.
    pub fn point(self) -> Option<f64> {
        match self {
            Root::Point(r) => Some(r),
            Root::Span { .. } => None,
        }
    }

    /// Leftmost point of this root entry, used for ordering.
    pub fn leftmost(self) -> f64 {
        match self {
            Root::Point(r) => r,
            Root::Span { start, .. } => start,
        }
    }
}

/// Errors reported by store construction and the operations on stores.
///
/// Domain-boundary conditions (queries outside the knot range under
/// `Extrapolate::Never`) are deliberately not errors: they produce NaN
/// entries so batch queries mixing in-range and out-of-range points still
/// return successfully.
#[derive(Debug, Error)]
pub enum PolyError {
    #[error("Knot sequence must be strictly increasing, but knots[{index}] >= knots[{}].", index + 1)]
    KnotsNotIncreasing { index: usize },

    #[error("Knot sequence contains a non-finite value at index {index}.")]
    NonFiniteKnot { index: usize },

    #[error("At least 2 knots (one interval) are required, but {provided} were provided.")]
    TooFewKnots { provided: usize },

    #[error(
        "Coefficient tensor must have at least 2 axes (basis terms, intervals), but has {ndim}."
    )]
    CoefficientRank { ndim: usize },

    #[error("Coefficient tensor has an empty basis-term axis; polynomial order must be at least 0.")]
    EmptyOrderAxis,

    #[error(
        "Coefficient tensor covers {coefficient_intervals} intervals but the knot sequence defines {knot_intervals}."
    )]
    IntervalCountMismatch {
        coefficient_intervals: usize,
        knot_intervals: usize,
    },

    #[error(
        "Extension coefficients carry trailing shape {extension:?}, which does not match the store's {store:?}."
    )]
    TrailingShapeMismatch {
        store: Vec<usize>,
        extension: Vec<usize>,
    },

    #[error(
        "Extension knots must continue the sequence monotonically past {boundary}, but {offending} does not."
    )]
    ExtensionNotMonotone { boundary: f64, offending: f64 },

    #[error("Extension requires one coefficient column per new knot: got {columns} columns for {knots} knots.")]
    ExtensionShapeMismatch { columns: usize, knots: usize },

    #[error("Hermite construction needs xi and yi of equal length, but got {xi} and {yi}.")]
    DerivativeDataLengthMismatch { xi: usize, yi: usize },

    #[error("Hermite construction needs at least two knots, but got {provided}.")]
    TooFewHermiteKnots { provided: usize },

    #[error("Hermite knot sequence must be strictly increasing, but xi[{index}] >= xi[{}].", index + 1)]
    HermiteKnotsNotIncreasing { index: usize },

    #[error("No derivative values were prescribed at knot {knot}.")]
    EmptyDerivativeData { knot: f64 },

    #[error("Requested polynomial orders must be positive.")]
    OrdersNotPositive,

    #[error("Per-interval orders list has {provided} entries for {expected} intervals.")]
    OrdersLengthMismatch { expected: usize, provided: usize },

    #[error(
        "Order {order} requested on [{left}, {right}], but only {left_available} derivatives are known at {left} and {right_available} at {right}."
    )]
    OrderExceedsData {
        order: usize,
        left: f64,
        right: f64,
        left_available: usize,
        right_available: usize,
    },

    #[error("Spline descriptor is invalid: {0}")]
    InvalidSpline(String),

    #[error("Eigenvalue computation for the companion matrix failed: {0}")]
    Linalg(#[from] LinalgError),
}

/// Shared construction-time validation for both store variants.
pub(crate) fn validate_layout(
    coefficients: &ArrayD<f64>,
    knots: &Array1<f64>,
) -> Result<(), PolyError> {
    if coefficients.ndim() < 2 {
        return Err(PolyError::CoefficientRank {
            ndim: coefficients.ndim(),
        });
    }
    if coefficients.shape()[0] == 0 {
        return Err(PolyError::EmptyOrderAxis);
    }
    if knots.len() < 2 {
        return Err(PolyError::TooFewKnots {
            provided: knots.len(),
        });
    }
    for (index, &k) in knots.iter().enumerate() {
        if !k.is_finite() {
            return Err(PolyError::NonFiniteKnot { index });
        }
    }
    for index in 0..knots.len() - 1 {
        if knots[index] >= knots[index + 1] {
            return Err(PolyError::KnotsNotIncreasing { index });
        }
    }
    let knot_intervals = knots.len() - 1;
    if coefficients.shape()[1] != knot_intervals {
        return Err(PolyError::IntervalCountMismatch {
            coefficient_intervals: coefficients.shape()[1],
            knot_intervals,
        });
    }
    Ok(())
}
