//! The light-curve value type.
//!
//! A `LightCurve` is validated once, at construction: `flux` and every optional
//! per-point column must have the same length as `time`. After that the value is
//! read-only; every transformation (`detrend`, `remove_nans`, `filter_quality`)
//! returns a new instance.

use std::io::Write;

use serde::Serialize;

use crate::detrend::{CentroidTrack, detrender_for};
use crate::domain::extension::Collaborators;
use crate::domain::types::{DetrendMethod, DetrendOptions};
use crate::error::LightCurveError;
use crate::math::{mean, median, robust_sigma, std_dev};

/// One time-series of brightness measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightCurve {
    time: Vec<f64>,
    flux: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    flux_err: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quality: Option<Vec<i32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    centroid_col: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    centroid_row: Option<Vec<f64>>,
}

/// Summary statistics of the finite flux values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightCurveStats {
    pub n_points: usize,
    pub n_finite: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    /// `1.4826 * MAD`, a noise estimate insensitive to outliers.
    pub robust_sigma: f64,
    pub time_min: f64,
    pub time_max: f64,
}

impl LightCurve {
    /// Build a light curve with no optional columns.
    pub fn new(time: Vec<f64>, flux: Vec<f64>) -> Result<Self, LightCurveError> {
        Self::from_parts(time, flux, None, None, None, None)
    }

    /// Start a builder for a light curve with optional columns.
    pub fn builder(time: Vec<f64>, flux: Vec<f64>) -> LightCurveBuilder {
        LightCurveBuilder {
            time,
            flux,
            flux_err: None,
            quality: None,
            centroid_col: None,
            centroid_row: None,
        }
    }

    /// Build a light curve from all columns, validating every length against `time`.
    pub fn from_parts(
        time: Vec<f64>,
        flux: Vec<f64>,
        flux_err: Option<Vec<f64>>,
        quality: Option<Vec<i32>>,
        centroid_col: Option<Vec<f64>>,
        centroid_row: Option<Vec<f64>>,
    ) -> Result<Self, LightCurveError> {
        let n = time.len();
        check_len("flux", n, flux.len())?;
        if let Some(v) = &flux_err {
            check_len("flux_err", n, v.len())?;
        }
        if let Some(v) = &quality {
            check_len("quality", n, v.len())?;
        }
        if let Some(v) = &centroid_col {
            check_len("centroid_col", n, v.len())?;
        }
        if let Some(v) = &centroid_row {
            check_len("centroid_row", n, v.len())?;
        }

        Ok(Self {
            time,
            flux,
            flux_err,
            quality,
            centroid_col,
            centroid_row,
        })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn flux_err(&self) -> Option<&[f64]> {
        self.flux_err.as_deref()
    }

    pub fn quality(&self) -> Option<&[i32]> {
        self.quality.as_deref()
    }

    pub fn centroid_col(&self) -> Option<&[f64]> {
        self.centroid_col.as_deref()
    }

    pub fn centroid_row(&self) -> Option<&[f64]> {
        self.centroid_row.as_deref()
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Centroid track, available only when both coordinates are present.
    pub fn centroids(&self) -> Option<CentroidTrack<'_>> {
        match (&self.centroid_col, &self.centroid_row) {
            (Some(col), Some(row)) => Some(CentroidTrack { col, row }),
            _ => None,
        }
    }

    /// Detrend with a method named by its identifier (e.g. `"polynomial"`).
    ///
    /// Unrecognized names fail with [`LightCurveError::UnknownMethod`].
    pub fn detrend(&self, method: &str, options: &DetrendOptions) -> Result<LightCurve, LightCurveError> {
        let method: DetrendMethod = method.parse()?;
        self.detrend_with(method, options)
    }

    /// Detrend with an already-resolved method.
    pub fn detrend_with(
        &self,
        method: DetrendMethod,
        options: &DetrendOptions,
    ) -> Result<LightCurve, LightCurveError> {
        let detrender = detrender_for(method, options, self.centroids());
        log::debug!("detrending {} points with {}", self.len(), detrender.name());
        detrender.detrend(&self.time, &self.flux, self.flux_err.as_deref())
    }

    /// Write this light curve in `format` using a registered exporter.
    pub fn export(
        &self,
        format: &str,
        collaborators: &Collaborators,
        out: &mut dyn Write,
    ) -> Result<(), LightCurveError> {
        let exporter = collaborators
            .exporter(format)
            .ok_or_else(|| LightCurveError::NotImplemented {
                feature: format!("export to `{format}`"),
            })?;
        exporter.export(self, out)
    }

    /// Render this light curve using the registered renderer.
    pub fn render(&self, collaborators: &Collaborators) -> Result<String, LightCurveError> {
        let renderer = collaborators
            .renderer()
            .ok_or_else(|| LightCurveError::NotImplemented {
                feature: "render".to_string(),
            })?;
        renderer.render(self)
    }

    /// Drop points whose time or flux is not finite.
    pub fn remove_nans(&self) -> LightCurve {
        let keep: Vec<bool> = self
            .time
            .iter()
            .zip(&self.flux)
            .map(|(t, f)| t.is_finite() && f.is_finite())
            .collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            log::warn!("dropping {dropped} non-finite points");
        }
        self.select(&keep)
    }

    /// Drop points whose quality flag shares any bit with `bitmask`.
    ///
    /// A zero mask, or a curve without quality flags, keeps every point.
    pub fn filter_quality(&self, bitmask: i32) -> LightCurve {
        let Some(quality) = &self.quality else {
            return self.clone();
        };
        let keep: Vec<bool> = quality.iter().map(|q| (q & bitmask) == 0).collect();
        self.select(&keep)
    }

    pub fn stats(&self) -> LightCurveStats {
        let finite: Vec<f64> = self.flux.iter().copied().filter(|f| f.is_finite()).collect();
        let (time_min, time_max) = self
            .time
            .iter()
            .filter(|t| t.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &t| (lo.min(t), hi.max(t)));

        LightCurveStats {
            n_points: self.len(),
            n_finite: finite.len(),
            mean: mean(&finite).unwrap_or(f64::NAN),
            median: median(&finite).unwrap_or(f64::NAN),
            std: std_dev(&finite).unwrap_or(f64::NAN),
            robust_sigma: robust_sigma(&finite).unwrap_or(f64::NAN),
            time_min,
            time_max,
        }
    }

    fn select(&self, keep: &[bool]) -> LightCurve {
        fn pick<T: Copy>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter_map(|(v, k)| k.then_some(*v))
                .collect()
        }

        LightCurve {
            time: pick(&self.time, keep),
            flux: pick(&self.flux, keep),
            flux_err: self.flux_err.as_deref().map(|v| pick(v, keep)),
            quality: self.quality.as_deref().map(|v| pick(v, keep)),
            centroid_col: self.centroid_col.as_deref().map(|v| pick(v, keep)),
            centroid_row: self.centroid_row.as_deref().map(|v| pick(v, keep)),
        }
    }
}

/// Builder for [`LightCurve`]; validation happens in [`LightCurveBuilder::build`].
#[derive(Debug, Clone)]
pub struct LightCurveBuilder {
    time: Vec<f64>,
    flux: Vec<f64>,
    flux_err: Option<Vec<f64>>,
    quality: Option<Vec<i32>>,
    centroid_col: Option<Vec<f64>>,
    centroid_row: Option<Vec<f64>>,
}

impl LightCurveBuilder {
    pub fn flux_err(mut self, flux_err: Vec<f64>) -> Self {
        self.flux_err = Some(flux_err);
        self
    }

    pub fn quality(mut self, quality: Vec<i32>) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn centroid_col(mut self, col: Vec<f64>) -> Self {
        self.centroid_col = Some(col);
        self
    }

    pub fn centroid_row(mut self, row: Vec<f64>) -> Self {
        self.centroid_row = Some(row);
        self
    }

    pub fn build(self) -> Result<LightCurve, LightCurveError> {
        LightCurve::from_parts(
            self.time,
            self.flux,
            self.flux_err,
            self.quality,
            self.centroid_col,
            self.centroid_row,
        )
    }
}

fn check_len(column: &'static str, expected: usize, actual: usize) -> Result<(), LightCurveError> {
    if expected == actual {
        Ok(())
    } else {
        Err(LightCurveError::ShapeMismatch {
            column,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LightCurve {
        LightCurve::builder(vec![0.0, 1.0, 2.0, 3.0], vec![10.0, 12.0, 15.0, 11.0])
            .flux_err(vec![0.1, 0.1, 0.2, 0.1])
            .quality(vec![0, 4, 0, 1])
            .centroid_col(vec![100.0, 100.1, 100.2, 100.1])
            .centroid_row(vec![50.0, 50.0, 50.1, 50.2])
            .build()
            .unwrap()
    }

    #[test]
    fn construction_keeps_columns_verbatim() {
        let lc = sample();
        assert_eq!(lc.time(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(lc.flux(), &[10.0, 12.0, 15.0, 11.0]);
        assert_eq!(lc.flux_err().unwrap(), &[0.1, 0.1, 0.2, 0.1]);
        assert_eq!(lc.quality().unwrap(), &[0, 4, 0, 1]);
        assert_eq!(lc.centroid_col().unwrap().len(), 4);
        assert_eq!(lc.centroid_row().unwrap()[3], 50.2);
        assert!(lc.centroids().is_some());
    }

    #[test]
    fn mismatched_optional_column_is_rejected() {
        let err = LightCurve::builder(vec![0.0, 1.0, 2.0], vec![1.0, 2.0, 3.0])
            .quality(vec![0, 0])
            .build()
            .unwrap_err();
        match err {
            LightCurveError::ShapeMismatch {
                column,
                expected,
                actual,
            } => {
                assert_eq!(column, "quality");
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn mismatched_flux_is_rejected() {
        assert!(matches!(
            LightCurve::new(vec![0.0, 1.0], vec![1.0]),
            Err(LightCurveError::ShapeMismatch { column: "flux", .. })
        ));
    }

    #[test]
    fn empty_curve_is_valid() {
        let lc = LightCurve::new(vec![], vec![]).unwrap();
        assert!(lc.is_empty());
        assert_eq!(lc.stats().n_finite, 0);
    }

    #[test]
    fn unknown_method_fails_instead_of_falling_back() {
        let lc = sample();
        let err = lc.detrend("no_such_method", &DetrendOptions::default()).unwrap_err();
        assert!(matches!(err, LightCurveError::UnknownMethod { .. }));
    }

    #[test]
    fn detrend_leaves_original_untouched() {
        let lc = sample();
        let before = lc.clone();
        let out = lc.detrend("first_difference", &DetrendOptions::default()).unwrap();
        assert_eq!(lc, before);
        assert_eq!(out.flux(), &[10.0, 2.0, 3.0, -4.0]);
        assert_eq!(out.flux_err(), lc.flux_err());
    }

    #[test]
    fn export_and_render_without_collaborators_are_not_implemented() {
        let lc = sample();
        let none = Collaborators::new();
        let mut buf = Vec::new();
        assert!(matches!(
            lc.export("csv", &none, &mut buf),
            Err(LightCurveError::NotImplemented { .. })
        ));
        assert!(matches!(lc.render(&none), Err(LightCurveError::NotImplemented { .. })));
    }

    #[test]
    fn filter_quality_drops_flagged_points() {
        let lc = sample();
        let kept = lc.filter_quality(1);
        assert_eq!(kept.time(), &[0.0, 1.0, 2.0]);
        assert_eq!(kept.quality().unwrap(), &[0, 4, 0]);

        let all = lc.filter_quality(0);
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn remove_nans_keeps_columns_aligned() {
        let lc = LightCurve::builder(vec![0.0, 1.0, 2.0], vec![1.0, f64::NAN, 3.0])
            .flux_err(vec![0.1, 0.2, 0.3])
            .build()
            .unwrap();
        let clean = lc.remove_nans();
        assert_eq!(clean.time(), &[0.0, 2.0]);
        assert_eq!(clean.flux_err().unwrap(), &[0.1, 0.3]);
    }

    #[test]
    fn stats_ignore_non_finite_flux() {
        let lc = LightCurve::new(vec![0.0, 1.0, 2.0, 3.0], vec![1.0, f64::NAN, 3.0, 5.0]).unwrap();
        let stats = lc.stats();
        assert_eq!(stats.n_points, 4);
        assert_eq!(stats.n_finite, 3);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.median - 3.0).abs() < 1e-12);
        assert_eq!(stats.time_min, 0.0);
        assert_eq!(stats.time_max, 3.0);
    }
}
