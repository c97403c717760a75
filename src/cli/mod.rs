//! Command-line parsing for the light-curve detrender.
//!
//! Argument parsing and command dispatch stay separate from the detrending
//! code: `app` turns these structs into a [`crate::domain::DetrendConfig`].

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::RobustKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lcd", version, about = "Light curve detrending for Kepler/K2-style photometry")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Detrend one or more light-curve CSV files and print a summary per file.
    Detrend(DetrendArgs),
    /// List the flux columns available in each input.
    FluxTypes(FluxTypesArgs),
    /// Write a synthetic light-curve CSV with pointing systematics.
    Simulate(SimulateArgs),
}

/// Export formats with a built-in exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DetrendArgs {
    /// Light-curve CSV files (one header row, one row per cadence).
    #[arg(required = true, value_name = "CSV")]
    pub inputs: Vec<PathBuf>,

    /// Flux column to detrend.
    #[arg(long, env = "LCD_FLUX_TYPE", default_value = "SAP_FLUX")]
    pub flux_type: String,

    /// Centroid column prefix; `<prefix>1` and `<prefix>2` are read.
    #[arg(long, env = "LCD_CENTROID_TYPE", default_value = "MOM_CENTR")]
    pub centroid_type: String,

    /// Detrend method: first_difference, linear, arclength, emd, polynomial.
    #[arg(short = 'm', long, env = "LCD_METHOD", default_value = "arclength")]
    pub method: String,

    /// Fixed polynomial degree (otherwise selected by BIC).
    #[arg(long)]
    pub degree: Option<usize>,

    /// Highest polynomial degree tried by BIC selection.
    #[arg(long, default_value_t = 5)]
    pub max_degree: usize,

    /// Outlier handling for the linear/polynomial fits.
    #[arg(long, value_enum, default_value_t = RobustKind::None)]
    pub robust: RobustKind,

    /// Number of IRLS iterations when `--robust huber`.
    #[arg(long, default_value_t = 3)]
    pub robust_iters: usize,

    /// Huber tuning constant.
    #[arg(long, default_value_t = 1.345)]
    pub robust_k: f64,

    /// Arc-length: number of time windows corrected independently.
    #[arg(long, default_value_t = 1)]
    pub windows: usize,

    /// Arc-length: number of arc-length bins.
    #[arg(long, default_value_t = 15)]
    pub bins: usize,

    /// Arc-length: degree of the centroid track polynomial.
    #[arg(long, default_value_t = 3)]
    pub centroid_degree: usize,

    /// EMD: maximum number of intrinsic mode functions.
    #[arg(long, default_value_t = 8)]
    pub max_imfs: usize,

    /// EMD: maximum sifting iterations per IMF.
    #[arg(long, default_value_t = 10)]
    pub sift_iters: usize,

    /// EMD: sifting stop threshold.
    #[arg(long, default_value_t = 0.2)]
    pub sift_threshold: f64,

    /// Drop cadences whose QUALITY shares a bit with this mask (0 keeps all, -1 drops any flag).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub quality_bitmask: i32,

    /// Keep cadences with non-finite time or flux.
    #[arg(long)]
    pub keep_nans: bool,

    /// Offset from the time column to Julian Date (Kepler BKJD: 2454833).
    #[arg(long, default_value_t = 2_454_833.0)]
    pub time_offset: f64,

    /// Print an ASCII plot of each detrended light curve.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export detrended light curves: a file for one input, a directory for several.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export format.
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub export_format: ExportFormat,
}

#[derive(Debug, Args, Clone)]
pub struct FluxTypesArgs {
    #[arg(required = true, value_name = "CSV")]
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    /// Output CSV path (stdout when omitted).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Number of cadences.
    #[arg(short = 'n', long, default_value_t = 2000)]
    pub n_points: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fractional white-noise level.
    #[arg(long, default_value_t = 1e-4)]
    pub noise: f64,

    /// Fractional flux loss at the ends of the pointing track.
    #[arg(long, default_value_t = 4e-3)]
    pub systematic: f64,

    /// Fractional linear drift over the whole series.
    #[arg(long, default_value_t = 2e-3)]
    pub trend: f64,

    /// Days between pointing resets.
    #[arg(long, default_value_t = 0.245)]
    pub roll_period: f64,

    /// Probability of a QUALITY flag per cadence.
    #[arg(long, default_value_t = 0.01)]
    pub flag_rate: f64,

    /// Probability of a missing SAP_FLUX value per cadence.
    #[arg(long, default_value_t = 0.002)]
    pub gap_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detrend_defaults() {
        let cli = Cli::try_parse_from(["lcd", "detrend", "a.csv", "b.csv"]).unwrap();
        let Command::Detrend(args) = cli.command else {
            panic!("expected detrend");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.flux_type, "SAP_FLUX");
        assert_eq!(args.centroid_type, "MOM_CENTR");
        assert_eq!(args.method, "arclength");
        assert_eq!(args.export_format, ExportFormat::Csv);
        assert!(!args.plot);
    }

    #[test]
    fn negative_quality_mask_parses() {
        let cli = Cli::try_parse_from(["lcd", "detrend", "--quality-bitmask", "-1", "a.csv"]).unwrap();
        let Command::Detrend(args) = cli.command else {
            panic!("expected detrend");
        };
        assert_eq!(args.quality_bitmask, -1);
    }

    #[test]
    fn detrend_requires_an_input() {
        assert!(Cli::try_parse_from(["lcd", "detrend"]).is_err());
    }

    #[test]
    fn simulate_parses() {
        let cli = Cli::try_parse_from(["lcd", "simulate", "-n", "100", "-o", "out.csv"]).unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.n_points, 100);
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
    }
}
