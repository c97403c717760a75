//! Top-level application orchestration.
//!
//! `src/main.rs` is tiny; this module is the real main that:
//! - loads `.env` and initializes logging
//! - parses CLI arguments
//! - runs the detrend pipeline over every input
//! - prints summaries/plots and writes optional exports

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{Command, DetrendArgs, FluxTypesArgs, SimulateArgs};
use crate::data::{SimulateConfig, generate_sample};
use crate::domain::{Collaborators, DetrendConfig, DetrendMethod, DetrendOptions};
use crate::error::AppError;
use crate::io::{CsvExporter, JsonExporter, write_column_table, write_column_table_csv};
use crate::plot::AsciiRenderer;

pub mod pipeline;

/// Entry point for the `lcd` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env file is fine; flags and the real environment still apply.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Detrend(args) => handle_detrend(&args),
        Command::FluxTypes(args) => handle_flux_types(&args),
        Command::Simulate(args) => handle_simulate(&args),
    }
}

fn handle_detrend(args: &DetrendArgs) -> Result<(), AppError> {
    let config = detrend_config_from_args(args);
    // Reject a bad method before touching any file.
    let _: DetrendMethod = config.method.parse()?;

    let collaborators = Collaborators::new()
        .with_exporter(CsvExporter)
        .with_exporter(JsonExporter)
        .with_renderer(AsciiRenderer::new(config.plot_width, config.plot_height));

    let mut first_error = None;
    for result in pipeline::run_detrend(&config) {
        let run = match result {
            Ok(run) => run,
            Err(err) => {
                eprintln!("{err}");
                first_error.get_or_insert(err);
                continue;
            }
        };

        println!("{}", crate::report::format_run_summary(&run.summary));
        if config.plot {
            println!("{}", run.detrended.render(&collaborators)?);
        }
        if let Some(export) = &config.export {
            let path = export_path(export, &run.input, &config)?;
            write_export(&path, &run.detrended, &config.export_format, &collaborators)?;
            log::info!("wrote {}", path.display());
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_flux_types(args: &FluxTypesArgs) -> Result<(), AppError> {
    for path in &args.inputs {
        let file = pipeline::load_record(path)?;
        print!(
            "{}",
            crate::report::format_flux_types(&path.display().to_string(), &file.flux_types())
        );
    }
    Ok(())
}

fn handle_simulate(args: &SimulateArgs) -> Result<(), AppError> {
    let sample = generate_sample(&simulate_config_from_args(args))?;
    match &args.output {
        Some(path) => write_column_table_csv(path, &sample.table),
        None => write_column_table(io::stdout().lock(), &sample.table).map_err(AppError::from),
    }
}

pub fn detrend_config_from_args(args: &DetrendArgs) -> DetrendConfig {
    DetrendConfig {
        inputs: args.inputs.clone(),
        flux_type: args.flux_type.clone(),
        centroid_type: args.centroid_type.clone(),
        method: args.method.clone(),
        options: DetrendOptions {
            degree: args.degree,
            max_degree: args.max_degree,
            robust: args.robust,
            robust_iters: args.robust_iters,
            robust_k: args.robust_k,
            windows: args.windows,
            bins: args.bins,
            centroid_degree: args.centroid_degree,
            max_imfs: args.max_imfs,
            sift_iters: args.sift_iters,
            sift_threshold: args.sift_threshold,
        },
        quality_bitmask: args.quality_bitmask,
        remove_nans: !args.keep_nans,
        time_offset: args.time_offset,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export: args.export.clone(),
        export_format: args.export_format.as_str().to_string(),
    }
}

pub fn simulate_config_from_args(args: &SimulateArgs) -> SimulateConfig {
    SimulateConfig {
        n_points: args.n_points,
        seed: args.seed,
        noise: args.noise,
        systematic: args.systematic,
        trend: args.trend,
        roll_period: args.roll_period,
        flag_rate: args.flag_rate,
        gap_rate: args.gap_rate,
        ..SimulateConfig::default()
    }
}

/// Where one input's export goes.
///
/// With a single input `--export` is the file itself; with several it is a
/// directory holding `<input stem>.<format>`.
fn export_path(export: &Path, input: &Path, config: &DetrendConfig) -> Result<PathBuf, AppError> {
    if config.inputs.len() == 1 {
        return Ok(export.to_path_buf());
    }
    fs::create_dir_all(export).map_err(|e| {
        AppError::new(2, format!("Failed to create export directory '{}': {e}", export.display()))
    })?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lightcurve".to_string());
    Ok(export.join(format!("{stem}.{}", config.export_format)))
}

fn write_export(
    path: &Path,
    lc: &crate::domain::LightCurve,
    format: &str,
    collaborators: &Collaborators,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    lc.export(format, collaborators, &mut out)?;
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to write export '{}': {e}", path.display())))
}
