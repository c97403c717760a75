//! Low-level fitting routine for a single polynomial degree.
//!
//! Given:
//! - timestamps `t_i`
//! - flux values `f_i`
//! - base weights `w_i` (usually `1/σ_i²`)
//!
//! we solve a weighted least-squares problem in the Legendre basis on normalized
//! time and report the coefficients together with the weighted SSE.
//!
//! Inputs must already be restricted to finite points; callers handle gaps.

use nalgebra::{DMatrix, DVector};

use crate::domain::RobustKind;
use crate::error::LightCurveError;
use crate::math::{AxisScale, eval_legendre, fill_legendre_row, median_mut, solve_weighted_least_squares};

/// Fitting options that affect how each trend is calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Robust fitting mode (outlier downweighting).
    pub robust: RobustKind,
    /// Number of IRLS reweight iterations.
    pub robust_iters: usize,
    /// Huber tuning constant.
    pub robust_k: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            robust: RobustKind::None,
            robust_iters: 3,
            robust_k: 1.345,
        }
    }
}

/// Best fit for a single polynomial degree.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyFit {
    pub degree: usize,
    /// Legendre coefficients on the normalized time axis.
    pub coeffs: Vec<f64>,
    pub scale: AxisScale,
    /// Weighted sum of squared residuals (base weights).
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
}

impl PolyFit {
    /// Evaluate the fitted trend at time `t`.
    pub fn predict(&self, t: f64) -> f64 {
        eval_legendre(&self.coeffs, self.scale.apply(t))
    }

    /// Number of free parameters.
    pub fn param_count(&self) -> usize {
        self.degree + 1
    }
}

/// Fit a polynomial of `degree` to `(time, flux)` with base weights `weights`.
pub fn fit_polynomial(
    method: &'static str,
    time: &[f64],
    flux: &[f64],
    weights: &[f64],
    degree: usize,
    opts: &FitOptions,
) -> Result<PolyFit, LightCurveError> {
    let n = time.len();
    let p = degree + 1;
    if n < p {
        return Err(LightCurveError::InsufficientData {
            method,
            needed: p,
            got: n,
        });
    }

    let scale = AxisScale::from_values(time);
    let mut x = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &t) in time.iter().enumerate() {
        fill_legendre_row(scale.apply(t), &mut row);
        for (j, &v) in row.iter().enumerate() {
            x[(i, j)] = v;
        }
    }
    let y = DVector::from_column_slice(flux);

    // Robust fitting is a small number of outer iterations:
    //
    // - start with base weights
    // - solve weighted OLS
    // - compute residuals
    // - update weights (Huber) and repeat
    let n_refits = match opts.robust {
        RobustKind::None => 1,
        RobustKind::Huber => opts.robust_iters.saturating_add(1).max(1),
    };

    let mut w_work = weights.to_vec();
    let mut coeffs = None;
    for _ in 0..n_refits {
        let beta = solve_weighted_least_squares(&x, &y, &w_work).ok_or_else(|| LightCurveError::FitFailed {
            method,
            reason: format!("least-squares solve did not converge for degree {degree}"),
        })?;

        let residuals: Vec<f64> = (&x * &beta - &y).iter().map(|r| -r).collect();
        coeffs = Some(beta);

        if opts.robust == RobustKind::None {
            break;
        }
        w_work = huber_reweight(weights, &residuals, opts.robust_k);
    }

    let Some(coeffs) = coeffs else {
        return Err(LightCurveError::FitFailed {
            method,
            reason: "no fit iterations ran".to_string(),
        });
    };
    let coeffs: Vec<f64> = coeffs.iter().copied().collect();

    let sse: f64 = time
        .iter()
        .zip(flux)
        .zip(weights)
        .map(|((&t, &f), &w)| {
            let r = f - eval_legendre(&coeffs, scale.apply(t));
            w * r * r
        })
        .sum();
    let rmse = (sse / n as f64).sqrt();

    log::debug!("{method}: degree {degree} fit on {n} points, rmse={rmse:.6}");

    Ok(PolyFit {
        degree,
        coeffs,
        scale,
        sse,
        rmse,
        n,
    })
}

fn huber_reweight(w_base: &[f64], residuals: &[f64], k: f64) -> Vec<f64> {
    // Scale via MAD (median absolute deviation). This keeps weighting robust and
    // deterministic (no RNG).
    let mut abs: Vec<f64> = residuals.iter().map(|r| r.abs()).filter(|v| v.is_finite()).collect();
    let mad = median_mut(&mut abs).unwrap_or(0.0);
    let scale = (mad / 0.6745).max(1e-12);
    let cutoff = (k.max(1e-6)) * scale;

    let min_factor = 1e-3;
    w_base
        .iter()
        .zip(residuals.iter())
        .map(|(&w0, &r)| {
            let ar = r.abs();
            let factor = if ar <= cutoff || !ar.is_finite() { 1.0 } else { cutoff / ar };
            (w0 * factor).max(w0 * min_factor)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_is_recovered_exactly() {
        let time: Vec<f64> = (0..50).map(|i| 1000.0 + i as f64 * 0.5).collect();
        let flux: Vec<f64> = time.iter().map(|t| 3.0 - 0.2 * (t - 1000.0) + 0.01 * (t - 1000.0).powi(2)).collect();
        let w = vec![1.0; time.len()];

        let fit = fit_polynomial("test", &time, &flux, &w, 2, &FitOptions::default()).unwrap();
        assert!(fit.sse < 1e-12, "sse={}", fit.sse);
        assert!((fit.predict(1010.0) - (3.0 - 2.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn too_few_points_is_insufficient_data() {
        let err = fit_polynomial("test", &[0.0, 1.0], &[1.0, 2.0], &[1.0, 1.0], 3, &FitOptions::default())
            .unwrap_err();
        assert!(matches!(err, LightCurveError::InsufficientData { needed: 4, got: 2, .. }));
    }

    #[test]
    fn huber_downweights_outlier() {
        let time: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let mut flux: Vec<f64> = time.iter().map(|t| 1.0 + 0.1 * t).collect();
        flux[20] += 50.0;
        let w = vec![1.0; time.len()];

        let plain = fit_polynomial("test", &time, &flux, &w, 1, &FitOptions::default()).unwrap();
        let robust = fit_polynomial(
            "test",
            &time,
            &flux,
            &w,
            1,
            &FitOptions {
                robust: RobustKind::Huber,
                robust_iters: 10,
                robust_k: 1.345,
            },
        )
        .unwrap();

        let truth = 1.0 + 0.1 * 5.0;
        assert!((robust.predict(5.0) - truth).abs() < (plain.predict(5.0) - truth).abs());
        assert!((robust.predict(5.0) - truth).abs() < 0.1);
    }
}
