//! Light curves from a photometry record.
//!
//! A Kepler/TESS light-curve table carries one time column, several flux
//! columns (`SAP_FLUX`, `PDCSAP_FLUX`, ...), a matching `<type>_ERR` column
//! per flux type, a `QUALITY` bitmask and centroid columns named by a prefix
//! plus `1` (column) / `2` (row). [`LightCurveFile`] turns such a record into
//! [`LightCurve`] values.

use crate::domain::LightCurve;
use crate::error::LightCurveError;
use crate::io::source::{ColumnSource, flag_value};

pub const TIME_COLUMN: &str = "TIME";
pub const QUALITY_COLUMN: &str = "QUALITY";
pub const DEFAULT_CENTROID_TYPE: &str = "MOM_CENTR";
pub const SAP_FLUX: &str = "SAP_FLUX";
pub const PDCSAP_FLUX: &str = "PDCSAP_FLUX";

/// Factory for light curves over a loaded record.
#[derive(Debug, Clone)]
pub struct LightCurveFile<S> {
    source: S,
}

impl<S: ColumnSource> LightCurveFile<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Flux types available in this record, in column order.
    ///
    /// Any column whose name contains `FLUX` counts, except the `_ERR`
    /// uncertainty columns.
    pub fn flux_types(&self) -> Vec<String> {
        self.source
            .column_names()
            .into_iter()
            .filter(|n| n.contains("FLUX") && !n.ends_with("_ERR"))
            .map(str::to_string)
            .collect()
    }

    /// Light curve for `flux_type`, with centroids from `MOM_CENTR1/2`.
    pub fn get_lightcurve(&self, flux_type: &str) -> Result<LightCurve, LightCurveError> {
        self.get_lightcurve_with_centroid(flux_type, DEFAULT_CENTROID_TYPE)
    }

    /// Light curve for `flux_type`, with centroids from `<centroid_type>1/2`.
    ///
    /// `TIME` is required; the error, quality and centroid columns are attached
    /// when present.
    pub fn get_lightcurve_with_centroid(
        &self,
        flux_type: &str,
        centroid_type: &str,
    ) -> Result<LightCurve, LightCurveError> {
        let available = self.flux_types();
        if !available.iter().any(|n| n == flux_type) {
            return Err(LightCurveError::InvalidFluxType {
                requested: flux_type.to_string(),
                available,
            });
        }

        let time = self
            .source
            .float_column(TIME_COLUMN)
            .ok_or_else(|| LightCurveError::MissingColumn {
                name: TIME_COLUMN.to_string(),
            })?;
        let flux = self
            .source
            .float_column(flux_type)
            .ok_or_else(|| LightCurveError::MissingColumn {
                name: flux_type.to_string(),
            })?;

        let err_name = format!("{flux_type}_ERR");
        let flux_err = self.source.float_column(&err_name);
        let quality = self.quality_flags();
        let centroid_col = self.source.float_column(&format!("{centroid_type}1"));
        let centroid_row = self.source.float_column(&format!("{centroid_type}2"));

        if flux_err.is_none() {
            log::debug!("no {err_name} column; light curve has no uncertainties");
        }
        if centroid_col.is_none() || centroid_row.is_none() {
            log::debug!("no complete {centroid_type}1/2 centroid columns");
        }

        LightCurve::from_parts(time, flux, flux_err, quality, centroid_col, centroid_row)
    }

    /// The `QUALITY` bitmask, if present.
    ///
    /// Blank (non-finite) entries carry no flags and read as 0. A column with
    /// fractional or out-of-range values is ignored.
    fn quality_flags(&self) -> Option<Vec<i32>> {
        if let Some(flags) = self.source.flag_column(QUALITY_COLUMN) {
            return Some(flags);
        }
        let raw = self.source.float_column(QUALITY_COLUMN)?;

        let blank = raw.iter().filter(|q| !q.is_finite()).count();
        let flags: Option<Vec<i32>> = raw
            .iter()
            .map(|&q| if q.is_finite() { flag_value(q) } else { Some(0) })
            .collect();
        match flags {
            Some(flags) => {
                log::warn!("{QUALITY_COLUMN}: {blank} blank entries read as 0 (no flags)");
                Some(flags)
            }
            None => {
                log::warn!("{QUALITY_COLUMN} has non-integer values; quality flags ignored");
                None
            }
        }
    }

    /// Simple aperture photometry flux.
    pub fn sap_flux(&self) -> Result<LightCurve, LightCurveError> {
        self.get_lightcurve(SAP_FLUX)
    }

    /// Pre-search data conditioned SAP flux.
    pub fn pdcsap_flux(&self) -> Result<LightCurve, LightCurveError> {
        self.get_lightcurve(PDCSAP_FLUX)
    }
}
