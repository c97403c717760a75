//! CSV ingest into a [`ColumnTable`].
//!
//! One header row of column names, then one row per cadence. Header names are
//! trimmed, stripped of a UTF-8 BOM and upper-cased, so `time`, ` TIME` and
//! `Time` all land on `TIME`. Empty cells and `nan` read as NaN; a row with a
//! cell that does not parse as a number is skipped and reported.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::AppError;
use crate::io::source::{Column, ColumnTable};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the column table plus what happened to each row.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: ColumnTable,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Read a light-curve CSV from disk.
pub fn read_column_table(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    read_column_table_from(file)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Read a light-curve CSV from any reader.
pub fn read_column_table_from<R: Read>(input: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let names = normalize_headers(&headers)?;

    let mut values: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &names) {
            Ok(row) => {
                for (column, v) in values.iter_mut().zip(row) {
                    column.push(v);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = rows_read - row_errors.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No valid rows in CSV."));
    }
    if !row_errors.is_empty() {
        log::warn!("skipped {} of {rows_read} CSV rows", row_errors.len());
    }

    let mut table = ColumnTable::new();
    for (name, column) in names.into_iter().zip(values) {
        table.insert(name, Column::Float(column));
    }

    Ok(IngestedTable {
        table,
        row_errors,
        rows_read,
        rows_used,
    })
}

fn normalize_headers(headers: &StringRecord) -> Result<Vec<String>, AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    for (i, name) in names.iter().enumerate() {
        if name.is_empty() {
            return Err(AppError::new(2, format!("CSV header {} is empty", i + 1)));
        }
        if names[..i].contains(name) {
            return Err(AppError::new(2, format!("Duplicate CSV column: `{name}`")));
        }
    }
    Ok(names)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_uppercase()
}

fn parse_row(record: &StringRecord, names: &[String]) -> Result<Vec<f64>, String> {
    if record.len() != names.len() {
        return Err(format!(
            "Expected {} fields, found {}.",
            names.len(),
            record.len()
        ));
    }
    record
        .iter()
        .zip(names)
        .map(|(cell, name)| parse_cell(cell).ok_or_else(|| format!("Invalid `{name}` value '{cell}'.")))
        .collect()
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    cell.parse::<f64>().ok()
}
