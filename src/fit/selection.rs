//! Polynomial degree selection using BIC with guardrails.
//!
//! Each candidate degree `d` (k = d + 1 parameters) is fitted and scored with:
//!
//! - BIC = n * ln(SSE/n) + k * ln(n)
//!
//! Selection rules:
//! 1. Exclude underdetermined degrees: require `n >= k + 5`
//! 2. Choose the degree with minimum BIC
//! 3. If ΔBIC < 2 between the best and a lower degree, pick the lower degree
//!
//! Short series where no degree clears rule 1 are fitted at the highest degree
//! with `n >= k` instead of being rejected.

use rayon::prelude::*;

use crate::error::LightCurveError;
use crate::fit::fitter::{FitOptions, PolyFit, fit_polynomial};

/// Minimum number of extra observations beyond parameter count.
const MIN_N_BUFFER: usize = 5;

/// A scored candidate fit.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFit {
    pub fit: PolyFit,
    pub bic: f64,
}

/// Output of fitting + selection.
#[derive(Debug, Clone)]
pub struct DegreeSelection {
    pub best: ScoredFit,
    /// Fits for all attempted degrees (after guardrails), lowest degree first.
    pub(crate) fits: Vec<ScoredFit>,
    /// Any degrees that were skipped and why (for diagnostics).
    pub(crate) skipped: Vec<(usize, String)>,
}

/// Fit every degree in `0..=max_degree` (in parallel) and select one by BIC.
pub fn select_degree(
    method: &'static str,
    time: &[f64],
    flux: &[f64],
    weights: &[f64],
    max_degree: usize,
    opts: &FitOptions,
) -> Result<DegreeSelection, LightCurveError> {
    let n = time.len();

    let mut skipped = Vec::new();
    let mut degrees = Vec::new();
    for degree in 0..=max_degree {
        let k = degree + 1;
        if n < k + MIN_N_BUFFER {
            skipped.push((
                degree,
                format!("Underdetermined: n={n} < k+{MIN_N_BUFFER}={}", k + MIN_N_BUFFER),
            ));
        } else {
            degrees.push(degree);
        }
    }

    if degrees.is_empty() {
        if n == 0 {
            return Err(LightCurveError::InsufficientData { method, needed: 1, got: 0 });
        }
        let degree = max_degree.min(n - 1);
        skipped.retain(|(d, _)| *d != degree);
        log::debug!("{method}: only {n} points, fitting degree {degree} without BIC selection");
        degrees.push(degree);
    }

    let results: Vec<Result<PolyFit, LightCurveError>> = degrees
        .par_iter()
        .map(|&degree| fit_polynomial(method, time, flux, weights, degree, opts))
        .collect();

    let mut fits = Vec::with_capacity(results.len());
    for (degree, result) in degrees.iter().zip(results) {
        match result {
            Ok(fit) => {
                let bic = bic(fit.n, fit.sse, fit.param_count());
                fits.push(ScoredFit { fit, bic });
            }
            Err(e) => skipped.push((*degree, e.to_string())),
        }
    }

    if fits.is_empty() {
        return Err(LightCurveError::FitFailed {
            method,
            reason: "no candidate degree could be fitted".to_string(),
        });
    }

    for (degree, reason) in &skipped {
        log::debug!("{method}: skipped degree {degree}: {reason}");
    }

    let best = select_by_bic(&fits);
    log::debug!(
        "{method}: selected degree {} (bic={:.3}) from {} candidates",
        best.fit.degree,
        best.bic,
        fits.len()
    );

    Ok(DegreeSelection { best, fits, skipped })
}

fn bic(n: usize, sse: f64, k: usize) -> f64 {
    let n_f = n as f64;
    let sse_per = (sse / n_f).max(1e-12);
    n_f * sse_per.ln() + (k as f64) * n_f.ln()
}

fn select_by_bic(fits: &[ScoredFit]) -> ScoredFit {
    let mut best = &fits[0];
    for f in &fits[1..] {
        if f.bic < best.bic {
            best = f;
        }
    }

    let best_bic = best.bic;

    // Prefer simplicity if within 2 BIC points. `fits` is ordered by degree, so
    // the first close-enough fit is the simplest one.
    fits.iter()
        .find(|f| f.bic <= best_bic + 2.0)
        .unwrap_or(best)
        .clone()
}
