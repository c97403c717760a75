//! Input/output around the light-curve core.
//!
//! - named-column sources (`source`)
//! - light-curve factory over a loaded record (`file`)
//! - CSV ingest (`ingest`)
//! - CSV/JSON exporters (`export`)

pub mod export;
pub mod file;
pub mod ingest;
pub mod source;

pub use export::*;
pub use file::*;
pub use ingest::*;
pub use source::*;
