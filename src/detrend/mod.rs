//! Detrending strategies.
//!
//! Every algorithm implements [`Detrender`]: a pure function from
//! `(time, flux, flux_err?)` to a new [`LightCurve`] whose `time` and
//! `flux_err` are passed through unchanged and whose `flux` has the trend
//! removed.
//!
//! Conventions shared by all variants:
//! - input lengths are re-checked and mismatches fail fast (`ShapeMismatch`)
//! - points with non-finite time or flux never enter a fit and come out as NaN
//! - inputs are borrowed, never modified

use crate::domain::{DetrendMethod, DetrendOptions, LightCurve};
use crate::error::LightCurveError;
use crate::fit::FitOptions;

pub mod arclength;
pub mod emd;
pub mod first_difference;
pub mod linear;
pub mod polynomial;

pub use arclength::ArcLengthDetrender;
pub use emd::EmdDetrender;
pub use first_difference::FirstDifferenceDetrender;
pub use linear::LinearDetrender;
pub use polynomial::PolynomialDetrender;

/// A flux-detrending algorithm.
pub trait Detrender {
    /// Identifier of the algorithm (matches [`DetrendMethod::as_str`]).
    fn name(&self) -> &'static str;

    fn detrend(
        &self,
        time: &[f64],
        flux: &[f64],
        flux_err: Option<&[f64]>,
    ) -> Result<LightCurve, LightCurveError>;
}

/// Borrowed centroid columns used as the arc-length auxiliary path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentroidTrack<'a> {
    pub col: &'a [f64],
    pub row: &'a [f64],
}

/// Build the detrender for `method`.
///
/// `centroids` is only consulted by the arc-length variant.
pub fn detrender_for<'a>(
    method: DetrendMethod,
    options: &DetrendOptions,
    centroids: Option<CentroidTrack<'a>>,
) -> Box<dyn Detrender + 'a> {
    match method {
        DetrendMethod::FirstDifference => Box::new(FirstDifferenceDetrender),
        DetrendMethod::Linear => Box::new(LinearDetrender::new(fit_options(options))),
        DetrendMethod::Polynomial => Box::new(PolynomialDetrender::new(
            options.degree,
            options.max_degree,
            fit_options(options),
        )),
        DetrendMethod::ArcLength => Box::new(
            ArcLengthDetrender::new(options.windows, options.bins, options.centroid_degree)
                .with_centroids(centroids),
        ),
        DetrendMethod::Emd => Box::new(EmdDetrender::new(
            options.max_imfs,
            options.sift_iters,
            options.sift_threshold,
        )),
    }
}

fn fit_options(options: &DetrendOptions) -> FitOptions {
    FitOptions {
        robust: options.robust,
        robust_iters: options.robust_iters,
        robust_k: options.robust_k,
    }
}

/// Fail fast on mismatched input lengths.
pub(crate) fn check_inputs(time: &[f64], flux: &[f64], flux_err: Option<&[f64]>) -> Result<(), LightCurveError> {
    let n = time.len();
    if flux.len() != n {
        return Err(LightCurveError::ShapeMismatch {
            column: "flux",
            expected: n,
            actual: flux.len(),
        });
    }
    if let Some(err) = flux_err {
        if err.len() != n {
            return Err(LightCurveError::ShapeMismatch {
                column: "flux_err",
                expected: n,
                actual: err.len(),
            });
        }
    }
    Ok(())
}

/// Indices whose time and flux are both finite.
pub(crate) fn finite_indices(time: &[f64], flux: &[f64]) -> Vec<usize> {
    (0..time.len())
        .filter(|&i| time[i].is_finite() && flux[i].is_finite())
        .collect()
}

/// Base fit weights for the selected points.
///
/// `1/σ²` when every selected uncertainty is finite and positive, otherwise uniform.
pub(crate) fn base_weights(flux_err: Option<&[f64]>, idx: &[usize]) -> Vec<f64> {
    if let Some(err) = flux_err {
        let usable = idx.iter().all(|&i| err[i].is_finite() && err[i] > 0.0);
        if usable {
            return idx.iter().map(|&i| 1.0 / (err[i] * err[i])).collect();
        }
        log::debug!("flux_err has non-positive or non-finite entries; using uniform weights");
    }
    vec![1.0; idx.len()]
}

/// Package a detrended flux series, passing `time` and `flux_err` through.
pub(crate) fn assemble(
    time: &[f64],
    flux: Vec<f64>,
    flux_err: Option<&[f64]>,
) -> Result<LightCurve, LightCurveError> {
    LightCurve::from_parts(time.to_vec(), flux, flux_err.map(<[f64]>::to_vec), None, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_method_builds_a_detrender_with_matching_name() {
        let opts = DetrendOptions::default();
        for method in DetrendMethod::ALL {
            let d = detrender_for(method, &opts, None);
            assert_eq!(d.name(), method.as_str());
        }
    }

    #[test]
    fn every_method_preserves_length_and_passes_errors_through() {
        let time: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.02).collect();
        let flux: Vec<f64> = time
            .iter()
            .map(|t| 1000.0 + 3.0 * (t - 100.0) + (t * 9.0).sin())
            .collect();
        let err = vec![0.5; time.len()];
        let opts = DetrendOptions::default();

        for method in DetrendMethod::ALL {
            let out = detrender_for(method, &opts, None)
                .detrend(&time, &flux, Some(&err))
                .unwrap_or_else(|e| panic!("{method} failed: {e}"));
            assert_eq!(out.len(), time.len(), "{method}");
            assert_eq!(out.flux().len(), flux.len(), "{method}");
            assert_eq!(out.time(), time.as_slice(), "{method}");
            assert_eq!(out.flux_err(), Some(err.as_slice()), "{method}");
        }
    }

    #[test]
    fn every_method_handles_short_and_empty_curves() {
        let opts = DetrendOptions::default();
        let time = [0.0, 1.0, 2.0, 3.0];
        let flux = [10.0, 12.0, 15.0, 11.0];

        for method in DetrendMethod::ALL {
            let d = detrender_for(method, &opts, None);
            let out = d
                .detrend(&time, &flux, None)
                .unwrap_or_else(|e| panic!("{method} failed on four points: {e}"));
            assert_eq!(out.len(), 4, "{method}");
            assert!(out.flux().iter().all(|f| f.is_finite()), "{method}");

            let empty = d
                .detrend(&[], &[], None)
                .unwrap_or_else(|e| panic!("{method} failed on an empty curve: {e}"));
            assert!(empty.is_empty(), "{method}");
        }
    }

    #[test]
    fn mismatched_inputs_fail_fast() {
        let opts = DetrendOptions::default();
        for method in DetrendMethod::ALL {
            let err = detrender_for(method, &opts, None)
                .detrend(&[0.0, 1.0, 2.0], &[1.0, 2.0], None)
                .unwrap_err();
            assert!(matches!(err, LightCurveError::ShapeMismatch { .. }), "{method}");
        }
    }

    #[test]
    fn weights_fall_back_to_uniform_on_bad_errors() {
        let err = [0.5, 0.0, 2.0];
        assert_eq!(base_weights(Some(&err), &[0, 2]), vec![4.0, 0.25]);
        assert_eq!(base_weights(Some(&err), &[0, 1]), vec![1.0, 1.0]);
        assert_eq!(base_weights(None, &[0, 1, 2]), vec![1.0; 3]);
    }
}
