//! Trend fitting.
//!
//! Responsibilities:
//!
//! - fit a weighted (optionally Huber-robust) polynomial trend of one degree
//! - evaluate candidate degrees (parallel) and select one by BIC

pub mod fitter;
pub mod selection;

pub use fitter::*;
pub use selection::*;
