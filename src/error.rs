//! Error types.
//!
//! - `LightCurveError`: typed failures raised by the library (construction,
//!   flux-type lookup, method dispatch, fitting, extension points).
//! - `AppError`: what the `lcd` binary reports, carrying a process exit code.

use thiserror::Error;

/// Failures raised by the light-curve model and the detrenders.
#[derive(Debug, Error)]
pub enum LightCurveError {
    /// A column's length disagrees with the length of `time`.
    #[error("shape mismatch: column `{column}` has length {actual}, expected {expected}")]
    ShapeMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The requested flux column is not one of the record's flux columns.
    #[error("{requested} is not a valid flux type. Available types are: {}", available.join(", "))]
    InvalidFluxType {
        requested: String,
        available: Vec<String>,
    },

    /// The requested detrend method name is not recognized.
    #[error("unknown detrend method `{method}`. Available methods are: {}", available.join(", "))]
    UnknownMethod {
        method: String,
        available: Vec<&'static str>,
    },

    /// An extension point was invoked without a collaborator to serve it.
    #[error("not implemented: {feature}")]
    NotImplemented { feature: String },

    /// A column required to build a light curve is absent from the source.
    #[error("missing required column `{name}`")]
    MissingColumn { name: String },

    /// Too few usable (finite) points for the requested fit.
    #[error("insufficient data for {method}: need at least {needed} finite points, got {got}")]
    InsufficientData {
        method: &'static str,
        needed: usize,
        got: usize,
    },

    /// The least-squares solve (or another numerical step) failed.
    #[error("fit failed for {method}: {reason}")]
    FitFailed { method: &'static str, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for LightCurveError {
    fn from(err: serde_json::Error) -> Self {
        LightCurveError::Serialize(err.to_string())
    }
}

impl From<csv::Error> for LightCurveError {
    fn from(err: csv::Error) -> Self {
        LightCurveError::Serialize(err.to_string())
    }
}

/// Error reported by the `lcd` binary.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<LightCurveError> for AppError {
    fn from(err: LightCurveError) -> Self {
        // 2 = input/usage, 3 = data, 4 = numerical.
        let exit_code = match &err {
            LightCurveError::UnknownMethod { .. }
            | LightCurveError::NotImplemented { .. }
            | LightCurveError::Io(_)
            | LightCurveError::Serialize(_) => 2,
            LightCurveError::ShapeMismatch { .. }
            | LightCurveError::InvalidFluxType { .. }
            | LightCurveError::MissingColumn { .. }
            | LightCurveError::InsufficientData { .. } => 3,
            LightCurveError::FitFailed { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}
