//! Shared "detrend pipeline" logic used by the `lcd` subcommands.
//!
//! One input file goes through:
//! CSV ingest -> light curve for the flux type -> quality/NaN filtering ->
//! detrend -> run summary
//!
//! Inputs are independent, so a batch is processed in parallel with rayon.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::domain::{DetrendConfig, DetrendMethod, LightCurve};
use crate::error::AppError;
use crate::io::{ColumnTable, LightCurveFile, read_column_table};
use crate::report::RunSummary;

/// All computed outputs for one input file.
#[derive(Debug, Clone)]
pub struct FileRun {
    pub input: PathBuf,
    pub detrended: LightCurve,
    pub summary: RunSummary,
}

/// Load a CSV record, reporting skipped rows through the log.
pub fn load_record(path: &Path) -> Result<LightCurveFile<ColumnTable>, AppError> {
    let ingested = read_column_table(path)?;
    for err in &ingested.row_errors {
        log::warn!("{}:{}: {}", path.display(), err.line, err.message);
    }
    log::debug!(
        "{}: {} of {} rows used",
        path.display(),
        ingested.rows_used,
        ingested.rows_read
    );
    Ok(LightCurveFile::new(ingested.table))
}

/// Run the pipeline for one input.
pub fn detrend_file(path: &Path, config: &DetrendConfig) -> Result<FileRun, AppError> {
    let method: DetrendMethod = config.method.parse()?;
    let file = load_record(path)?;

    let read = file.get_lightcurve_with_centroid(&config.flux_type, &config.centroid_type)?;
    let mut input = read.filter_quality(config.quality_bitmask);
    if input.len() < read.len() {
        log::info!(
            "{}: quality mask {:#x} dropped {} cadences",
            path.display(),
            config.quality_bitmask,
            read.len() - input.len()
        );
    }
    if config.remove_nans {
        input = input.remove_nans();
    }

    let detrended = input.detrend_with(method, &config.options)?;
    let summary = RunSummary::new(
        path.display().to_string(),
        config.flux_type.clone(),
        method,
        config.time_offset,
        &read,
        &input,
        &detrended,
    );

    Ok(FileRun {
        input: path.to_path_buf(),
        detrended,
        summary,
    })
}

/// Run the pipeline for every configured input, in parallel.
///
/// Results come back in input order; one failing file does not stop the others.
pub fn run_detrend(config: &DetrendConfig) -> Vec<Result<FileRun, AppError>> {
    config
        .inputs
        .par_iter()
        .map(|path| {
            detrend_file(path, config)
                .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
        })
        .collect()
}
