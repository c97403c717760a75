//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the validated light-curve value (`LightCurve`)
//! - method and option types for detrending (`DetrendMethod`, `DetrendOptions`)
//! - extension points for exporters and renderers (`Exporter`, `Renderer`)

pub mod extension;
pub mod lightcurve;
pub mod types;

pub use extension::*;
pub use lightcurve::*;
pub use types::*;
