//! Interval location over a sorted knot sequence.

/// Find the polynomial piece containing `x`.
///
/// Returns `j` such that `knots[j] <= x < knots[j+1]`, with the final
/// interval closed on the right (`x == knots[m]` maps to `m - 1`).
/// Out-of-domain queries clamp to the boundary interval when `extrapolate`
/// is set and otherwise return `None`; NaN queries always return `None`.
pub(crate) fn locate(knots: &[f64], x: f64, extrapolate: bool) -> Option<usize> {
    debug_assert!(knots.len() >= 2);
    let m = knots.len() - 1;
    if x.is_nan() {
        return None;
    }
    if x < knots[0] {
        return if extrapolate { Some(0) } else { None };
    }
    if x > knots[m] {
        return if extrapolate { Some(m - 1) } else { None };
    }
    if x == knots[m] {
        return Some(m - 1);
    }
    // partition_point yields the first knot strictly greater than x; the
    // interval index is one less.
    let j = knots.partition_point(|&k| k <= x) - 1;
    Some(j.min(m - 1))
}
