//! Shared configuration types.
//!
//! These types are intentionally small and serializable so they can be:
//!
//! - parsed from CLI flags (`clap::ValueEnum`)
//! - passed by value into detrenders
//! - echoed back in exports and reports

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::LightCurveError;

/// Which detrending algorithm to run.
///
/// Method names are matched case-sensitively against [`DetrendMethod::ALL`]
/// identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DetrendMethod {
    /// Successive differences (high-pass filter).
    #[value(name = "first_difference")]
    FirstDifference,
    /// Subtract a weighted straight-line fit in time.
    Linear,
    /// Self-flat-fielding against arc length along the centroid track.
    #[default]
    #[value(name = "arclength")]
    ArcLength,
    /// Subtract the residue of an empirical mode decomposition.
    Emd,
    /// Subtract a weighted polynomial fit in time.
    Polynomial,
}

impl DetrendMethod {
    pub const ALL: [DetrendMethod; 5] = [
        DetrendMethod::ArcLength,
        DetrendMethod::FirstDifference,
        DetrendMethod::Linear,
        DetrendMethod::Emd,
        DetrendMethod::Polynomial,
    ];

    /// Identifier used for dispatch, CLI flags and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            DetrendMethod::FirstDifference => "first_difference",
            DetrendMethod::Linear => "linear",
            DetrendMethod::ArcLength => "arclength",
            DetrendMethod::Emd => "emd",
            DetrendMethod::Polynomial => "polynomial",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            DetrendMethod::FirstDifference => "First difference",
            DetrendMethod::Linear => "Linear",
            DetrendMethod::ArcLength => "Arc length (SFF)",
            DetrendMethod::Emd => "Empirical mode decomposition",
            DetrendMethod::Polynomial => "Polynomial",
        }
    }

    pub fn identifiers() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.as_str()).collect()
    }
}

impl fmt::Display for DetrendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetrendMethod {
    type Err = LightCurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| LightCurveError::UnknownMethod {
                method: s.to_string(),
                available: Self::identifiers(),
            })
    }
}

/// Outlier-robust fitting mode.
///
/// When enabled, the fitter iteratively reweights observations based on residuals
/// (Huber IRLS). This keeps flares, transits and cosmic-ray hits from dragging
/// the fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RobustKind {
    /// Ordinary weighted least squares.
    #[default]
    None,
    /// Huber M-estimator via iterative reweighted least squares.
    Huber,
}

/// Knobs for the detrenders. Each variant reads only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetrendOptions {
    /// Fixed polynomial degree; `None` selects a degree by BIC.
    pub degree: Option<usize>,
    /// Highest degree tried when selecting by BIC.
    pub max_degree: usize,
    pub robust: RobustKind,
    /// Number of IRLS reweight iterations.
    pub robust_iters: usize,
    /// Huber tuning constant (in units of the robust residual scale).
    pub robust_k: f64,

    /// Number of equal-length time windows processed independently.
    pub windows: usize,
    /// Number of arc-length bins used to build the correction.
    pub bins: usize,
    /// Degree of the polynomial fitted through the rotated centroid track.
    pub centroid_degree: usize,

    /// Maximum number of intrinsic mode functions to extract.
    pub max_imfs: usize,
    /// Maximum sifting iterations per IMF.
    pub sift_iters: usize,
    /// Huang's standard-deviation stopping threshold for sifting.
    pub sift_threshold: f64,
}

impl Default for DetrendOptions {
    fn default() -> Self {
        Self {
            degree: None,
            max_degree: 5,
            robust: RobustKind::None,
            robust_iters: 3,
            robust_k: 1.345,
            windows: 1,
            bins: 15,
            centroid_degree: 3,
            max_imfs: 8,
            sift_iters: 10,
            sift_threshold: 0.2,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and environment).
#[derive(Debug, Clone)]
pub struct DetrendConfig {
    pub inputs: Vec<PathBuf>,
    pub flux_type: String,
    pub centroid_type: String,
    pub method: String,
    pub options: DetrendOptions,

    /// Drop points whose quality flag shares any bit with this mask (0 keeps all).
    pub quality_bitmask: i32,
    pub remove_nans: bool,

    /// Offset added to the time column to obtain a Julian Date.
    pub time_offset: f64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export: Option<PathBuf>,
    pub export_format: String,
}
