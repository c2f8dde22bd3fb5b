#![deny(dead_code)]
#![deny(unused_imports)]

pub mod bernstein;
pub mod convert;
mod evaluate;
mod extend;
pub mod faer_ndarray;
mod interval;
pub mod power;
pub mod roots;
pub mod spline;
pub mod types;

pub use bernstein::{BernsteinPiecewise, Orders};
pub use convert::{to_bernstein, to_power};
pub use faer_ndarray::{FaerEigenvalues, LinalgError};
pub use power::PowerPiecewise;
pub use roots::complex_roots;
pub use spline::SplineDescriptor;
pub use types::{Extrapolate, PolyError, Root};
