//! In-place extension of a store with additional intervals.
//!
//! Both bases share the same splice semantics: the new knot list names the
//! interval boundaries past the current end of the sequence (the shared
//! boundary knot is not repeated), with one coefficient column per new knot.
//! When the two sides disagree on polynomial order, the lower-order side is
//! zero-padded at its highest-degree slots, which is order-preserving in the
//! power basis and degree-raising-free bookkeeping in both layouts.

use ndarray::{Array1, ArrayD, IxDyn};

use crate::types::PolyError;

pub(crate) fn splice(
    base_c: &ArrayD<f64>,
    base_x: &Array1<f64>,
    add_c: &ArrayD<f64>,
    add_x: &Array1<f64>,
    append_right: bool,
) -> Result<(ArrayD<f64>, Array1<f64>), PolyError> {
    if add_c.ndim() < 2 {
        return Err(PolyError::CoefficientRank { ndim: add_c.ndim() });
    }
    if add_c.shape()[0] == 0 {
        return Err(PolyError::EmptyOrderAxis);
    }
    let trailing = &base_c.shape()[2..];
    if &add_c.shape()[2..] != trailing {
        return Err(PolyError::TrailingShapeMismatch {
            store: trailing.to_vec(),
            extension: add_c.shape()[2..].to_vec(),
        });
    }
    if add_c.shape()[1] != add_x.len() {
        return Err(PolyError::ExtensionShapeMismatch {
            columns: add_c.shape()[1],
            knots: add_x.len(),
        });
    }
    if add_x.is_empty() {
        return Ok((base_c.clone(), base_x.clone()));
    }
    for (index, &x) in add_x.iter().enumerate() {
        if !x.is_finite() {
            return Err(PolyError::NonFiniteKnot { index });
        }
    }
    for index in 0..add_x.len() - 1 {
        if add_x[index] >= add_x[index + 1] {
            return Err(PolyError::ExtensionNotMonotone {
                boundary: add_x[index],
                offending: add_x[index + 1],
            });
        }
    }
    if append_right {
        let boundary = base_x[base_x.len() - 1];
        if add_x[0] <= boundary {
            return Err(PolyError::ExtensionNotMonotone {
                boundary,
                offending: add_x[0],
            });
        }
    } else {
        let boundary = base_x[0];
        if add_x[add_x.len() - 1] >= boundary {
            return Err(PolyError::ExtensionNotMonotone {
                boundary,
                offending: add_x[add_x.len() - 1],
            });
        }
    }

    let k1 = base_c.shape()[0];
    let k2 = add_c.shape()[0];
    let k = k1.max(k2);
    let m1 = base_c.shape()[1];
    let m2 = add_x.len();
    let n_extra: usize = trailing.iter().product();

    let mut shape = vec![k, m1 + m2];
    shape.extend_from_slice(trailing);
    let mut merged = ArrayD::zeros(IxDyn(&shape));
    {
        let mut m3 = merged
            .view_mut()
            .into_shape_with_order((k, m1 + m2, n_extra))
            .expect("freshly allocated tensor reshapes");
        let c1 = base_c
            .to_shape((k1, m1, n_extra))
            .expect("store tensor reshapes to (order, intervals, slices)");
        let c2 = add_c
            .to_shape((k2, m2, n_extra))
            .expect("extension tensor reshapes to (order, intervals, slices)");
        let (off1, off2) = if append_right { (0, m1) } else { (m2, 0) };
        for j in 0..k1 {
            for i in 0..m1 {
                for q in 0..n_extra {
                    m3[[k - k1 + j, off1 + i, q]] = c1[[j, i, q]];
                }
            }
        }
        for j in 0..k2 {
            for i in 0..m2 {
                for q in 0..n_extra {
                    m3[[k - k2 + j, off2 + i, q]] = c2[[j, i, q]];
                }
            }
        }
    }

    let mut knots = Vec::with_capacity(base_x.len() + m2);
    if append_right {
        knots.extend(base_x.iter().copied());
        knots.extend(add_x.iter().copied());
    } else {
        knots.extend(add_x.iter().copied());
        knots.extend(base_x.iter().copied());
    }

    Ok((merged, Array1::from(knots)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_splice_right_pads_lower_order_side() {
        let base_c = array![[1.0], [2.0]].into_dyn();
        let base_x = array![0.0, 1.0];
        let add_c = array![[5.0]].into_dyn();
        let add_x = array![2.0];
        let (c, x) = splice(&base_c, &base_x, &add_c, &add_x, true).unwrap();
        assert_eq!(x, array![0.0, 1.0, 2.0]);
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c[[0, 1]], 0.0);
        assert_eq!(c[[1, 1]], 5.0);
        assert_eq!(c[[0, 0]], 1.0);
    }

    #[test]
    fn test_splice_left_orders_knots() {
        let base_c = array![[3.0]].into_dyn();
        let base_x = array![1.0, 2.0];
        let add_c = array![[7.0]].into_dyn();
        let add_x = array![0.0];
        let (c, x) = splice(&base_c, &base_x, &add_c, &add_x, false).unwrap();
        assert_eq!(x, array![0.0, 1.0, 2.0]);
        assert_eq!(c[[0, 0]], 7.0);
        assert_eq!(c[[0, 1]], 3.0);
    }

    #[test]
    fn test_splice_rejects_non_continuing_knots() {
        let base_c = array![[1.0]].into_dyn();
        let base_x = array![0.0, 1.0];
        let add_c = array![[2.0]].into_dyn();
        assert!(matches!(
            splice(&base_c, &base_x, &add_c, &array![1.0], true),
            Err(PolyError::ExtensionNotMonotone { .. })
        ));
        assert!(matches!(
            splice(&base_c, &base_x, &add_c, &array![0.5], false),
            Err(PolyError::ExtensionNotMonotone { .. })
        ));
    }

    #[test]
    fn test_splice_rejects_column_count_mismatch() {
        let base_c = array![[1.0]].into_dyn();
        let base_x = array![0.0, 1.0];
        let add_c = array![[2.0, 3.0]].into_dyn();
        assert!(matches!(
            splice(&base_c, &base_x, &add_c, &array![2.0], true),
            Err(PolyError::ExtensionShapeMismatch { columns: 2, knots: 1 })
        ));
    }
}
