//! Polynomial detrending.
//!
//! Fits a weighted least-squares polynomial in time (Legendre basis on
//! normalized time, see `math::basis`) and subtracts it. The degree is either
//! fixed or chosen by BIC over `0..=max_degree`.

use crate::detrend::{Detrender, assemble, base_weights, check_inputs, finite_indices};
use crate::domain::LightCurve;
use crate::error::LightCurveError;
use crate::fit::{FitOptions, PolyFit, fit_polynomial, select_degree};

#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialDetrender {
    degree: Option<usize>,
    max_degree: usize,
    fit: FitOptions,
}

impl PolynomialDetrender {
    pub fn new(degree: Option<usize>, max_degree: usize, fit: FitOptions) -> Self {
        Self {
            degree,
            max_degree,
            fit,
        }
    }

    /// Fit the trend on the finite points, returning it for inspection.
    pub fn fit_trend(
        &self,
        time: &[f64],
        flux: &[f64],
        flux_err: Option<&[f64]>,
    ) -> Result<PolyFit, LightCurveError> {
        check_inputs(time, flux, flux_err)?;
        let idx = finite_indices(time, flux);
        let t: Vec<f64> = idx.iter().map(|&i| time[i]).collect();
        let f: Vec<f64> = idx.iter().map(|&i| flux[i]).collect();
        let w = base_weights(flux_err, &idx);

        match self.degree {
            Some(degree) => fit_polynomial(self.name(), &t, &f, &w, degree, &self.fit),
            None => Ok(select_degree(self.name(), &t, &f, &w, self.max_degree, &self.fit)?.best.fit),
        }
    }
}

impl Default for PolynomialDetrender {
    fn default() -> Self {
        Self::new(None, 5, FitOptions::default())
    }
}

impl Detrender for PolynomialDetrender {
    fn name(&self) -> &'static str {
        "polynomial"
    }

    fn detrend(
        &self,
        time: &[f64],
        flux: &[f64],
        flux_err: Option<&[f64]>,
    ) -> Result<LightCurve, LightCurveError> {
        check_inputs(time, flux, flux_err)?;
        if finite_indices(time, flux).is_empty() {
            return assemble(time, vec![f64::NAN; time.len()], flux_err);
        }
        let trend = self.fit_trend(time, flux, flux_err)?;
        assemble(time, subtract_trend(time, flux, &trend), flux_err)
    }
}

/// `flux - trend(time)`; non-finite inputs map to NaN.
pub(crate) fn subtract_trend(time: &[f64], flux: &[f64], trend: &PolyFit) -> Vec<f64> {
    time.iter()
        .zip(flux)
        .map(|(&t, &f)| {
            if t.is_finite() && f.is_finite() {
                f - trend.predict(t)
            } else {
                f64::NAN
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RobustKind;
    use approx::assert_abs_diff_eq;

    fn time_axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| 2450.0 + i as f64 * 0.0204).collect()
    }

    #[test]
    fn fixed_degree_removes_quadratic_trend() {
        let time = time_axis(300);
        let flux: Vec<f64> = time
            .iter()
            .map(|t| {
                let x = t - 2450.0;
                5000.0 + 12.0 * x - 1.5 * x * x
            })
            .collect();

        let out = PolynomialDetrender::new(Some(2), 5, FitOptions::default())
            .detrend(&time, &flux, None)
            .unwrap();
        for f in out.flux() {
            assert_abs_diff_eq!(*f, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn selected_degree_keeps_periodic_signal() {
        let time = time_axis(500);
        let signal: Vec<f64> = time.iter().map(|t| 2.0 * (t * 40.0).sin()).collect();
        let flux: Vec<f64> = time
            .iter()
            .zip(&signal)
            .map(|(t, s)| 800.0 + 4.0 * (t - 2450.0) + s)
            .collect();

        let out = PolynomialDetrender::default().detrend(&time, &flux, None).unwrap();
        let rms: f64 = (out
            .flux()
            .iter()
            .zip(&signal)
            .map(|(o, s)| (o - s) * (o - s))
            .sum::<f64>()
            / signal.len() as f64)
            .sqrt();
        assert!(rms < 0.2, "rms={rms}");
    }

    #[test]
    fn nan_points_are_skipped_and_stay_nan() {
        let time = time_axis(50);
        let mut flux: Vec<f64> = time.iter().map(|t| 10.0 + (t - 2450.0)).collect();
        flux[7] = f64::NAN;

        let out = PolynomialDetrender::new(Some(1), 5, FitOptions::default())
            .detrend(&time, &flux, None)
            .unwrap();
        assert!(out.flux()[7].is_nan());
        assert_abs_diff_eq!(out.flux()[8], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn robust_fit_ignores_flare() {
        let time = time_axis(200);
        let mut flux: Vec<f64> = time.iter().map(|t| 100.0 + 2.0 * (t - 2450.0)).collect();
        for f in flux.iter_mut().skip(90).take(5) {
            *f += 40.0;
        }
        let fit = FitOptions {
            robust: RobustKind::Huber,
            robust_iters: 10,
            robust_k: 1.345,
        };

        let out = PolynomialDetrender::new(Some(1), 5, fit)
            .detrend(&time, &flux, None)
            .unwrap();
        assert_abs_diff_eq!(out.flux()[10], 0.0, epsilon = 0.1);
        assert!(out.flux()[92] > 39.0);
    }

    #[test]
    fn short_curve_uses_highest_fittable_degree() {
        let time = [0.0, 1.0, 2.0, 3.0];
        let flux = [10.0, 12.0, 15.0, 11.0];

        let out = PolynomialDetrender::default().detrend(&time, &flux, None).unwrap();
        assert_eq!(out.len(), 4);
        for f in out.flux() {
            assert_abs_diff_eq!(*f, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn too_few_points_for_degree() {
        let err = PolynomialDetrender::new(Some(4), 5, FitOptions::default())
            .detrend(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0], None)
            .unwrap_err();
        assert!(matches!(err, LightCurveError::InsufficientData { .. }));
    }
}
