//! Mathematical utilities: polynomial basis, weighted least squares, splines and
//! robust statistics.

pub mod basis;
pub mod ols;
pub mod spline;
pub mod stats;

pub use basis::*;
pub use ols::*;
pub use spline::*;
pub use stats::*;
