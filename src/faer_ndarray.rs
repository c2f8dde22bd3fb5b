//! Narrow ndarray <-> faer bridge.
//!
//! The root finder's only external numerical building block is a dense
//! eigenvalue routine for companion matrices. It is isolated here so an
//! alternative backend (e.g. a dedicated polynomial-root iteration) can be
//! substituted without touching the rest of the engine.

use faer::Mat;
use faer::linalg::solvers;
use ndarray::{ArrayBase, Data, Ix2};
use num_complex::Complex64;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinalgError {
    #[error("Eigendecomposition failed: {0:?}")]
    Eigen(solvers::EvdError),

    #[error("Eigenvalue routine requires a square matrix, got {rows}x{cols}.")]
    NotSquare { rows: usize, cols: usize },
}

/// Extension trait computing the complex eigenvalues of a real square matrix.
pub trait FaerEigenvalues {
    fn complex_eigenvalues(&self) -> Result<Vec<Complex64>, LinalgError>;
}

impl<S: Data<Elem = f64>> FaerEigenvalues for ArrayBase<S, Ix2> {
    fn complex_eigenvalues(&self) -> Result<Vec<Complex64>, LinalgError> {
        let (rows, cols) = self.dim();
        if rows != cols {
            return Err(LinalgError::NotSquare { rows, cols });
        }
        if rows == 0 {
            return Ok(Vec::new());
        }
        let mat = Mat::from_fn(rows, cols, |i, j| self[[i, j]]);
        let values = mat.eigenvalues().map_err(LinalgError::Eigen)?;
        Ok(values
            .into_iter()
            .map(|z| Complex64::new(z.re, z.im))
            .collect())
    }
}
