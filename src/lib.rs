//! `lc-detrend` library crate.
//!
//! Light-curve data model plus a family of detrending algorithms for
//! Kepler/K2-style photometry. The binary (`lcd`) is a thin wrapper around
//! this library so that:
//!
//! - core logic is testable without spawning processes
//! - the model and detrenders are reusable from other tools
//! - I/O and presentation stay outside the core (`io`, `plot`, `report`)

pub mod app;
pub mod cli;
pub mod data;
pub mod detrend;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
