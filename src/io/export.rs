//! Light-curve exporters (CSV, JSON) and table writing.
//!
//! These are the collaborators the `lcd` binary registers for
//! [`LightCurve::export`]; the library core does not depend on them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{Exporter, LightCurve};
use crate::error::{AppError, LightCurveError};
use crate::io::source::ColumnTable;

/// One row per point; optional columns appear only when present.
///
/// NaN is written as an empty cell, matching what the reader accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl Exporter for CsvExporter {
    fn format(&self) -> &str {
        "csv"
    }

    fn export(&self, lc: &LightCurve, out: &mut dyn Write) -> Result<(), LightCurveError> {
        let mut header = vec!["time", "flux"];
        let mut float_cols: Vec<&[f64]> = vec![lc.time(), lc.flux()];
        if let Some(err) = lc.flux_err() {
            header.push("flux_err");
            float_cols.push(err);
        }
        if let (Some(col), Some(row)) = (lc.centroid_col(), lc.centroid_row()) {
            header.extend(["centroid_col", "centroid_row"]);
            float_cols.extend([col, row]);
        }
        let quality = lc.quality();
        if quality.is_some() {
            header.push("quality");
        }

        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(&header)?;
        for i in 0..lc.len() {
            let mut record: Vec<String> = float_cols.iter().map(|c| format_cell(c[i])).collect();
            if let Some(q) = quality {
                record.push(q[i].to_string());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// The light curve as a JSON object of arrays. NaN becomes `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn format(&self) -> &str {
        "json"
    }

    fn export(&self, lc: &LightCurve, out: &mut dyn Write) -> Result<(), LightCurveError> {
        serde_json::to_writer_pretty(&mut *out, lc)?;
        writeln!(out)?;
        Ok(())
    }
}

/// Write a column table as CSV, header first, in column order.
pub fn write_column_table_csv(path: &Path, table: &ColumnTable) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;
    write_column_table(BufWriter::new(file), table)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV '{}': {e}", path.display())))
}

pub fn write_column_table<W: Write>(out: W, table: &ColumnTable) -> Result<(), LightCurveError> {
    let mut writer = csv::Writer::from_writer(out);
    let columns: Vec<_> = table.columns().collect();
    writer.write_record(columns.iter().map(|(name, _)| *name))?;
    for i in 0..table.n_rows() {
        let record: Vec<String> = columns
            .iter()
            .map(|(_, c)| if i < c.len() { format_cell(c.value(i)) } else { String::new() })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn format_cell(v: f64) -> String {
    if v.is_finite() { v.to_string() } else { String::new() }
}
