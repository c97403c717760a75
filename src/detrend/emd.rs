//! Empirical mode decomposition (EMD) detrending.
//!
//! The series is split by sifting into intrinsic mode functions (IMFs), from
//! fastest to slowest oscillation. What remains after the last IMF is the
//! residue: a curve with too few extrema to oscillate, i.e. the trend. The
//! detrended flux is `flux - residue`.
//!
//! Sifting one IMF:
//! - find local maxima/minima of the current candidate `h`
//! - draw natural cubic spline envelopes through them; both envelopes are also
//!   pinned to the series endpoints
//! - subtract the envelope mean from `h`
//! - stop after `sift_iters` rounds, or once Huang's SD criterion
//!   `Σ m² / Σ h²` drops below `sift_threshold`
//!
//! Decomposition stops when the residue has fewer than two maxima or two
//! minima, or after `max_imfs` IMFs.

use crate::detrend::{Detrender, assemble, check_inputs, finite_indices};
use crate::domain::LightCurve;
use crate::error::LightCurveError;
use crate::math::CubicSpline;

#[derive(Debug, Clone, PartialEq)]
pub struct EmdDetrender {
    max_imfs: usize,
    sift_iters: usize,
    sift_threshold: f64,
}

/// IMFs plus residue; `imfs.iter().sum() + residue` reproduces the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    pub imfs: Vec<Vec<f64>>,
    pub residue: Vec<f64>,
}

impl EmdDetrender {
    pub fn new(max_imfs: usize, sift_iters: usize, sift_threshold: f64) -> Self {
        Self {
            max_imfs,
            sift_iters: sift_iters.max(1),
            sift_threshold,
        }
    }

    /// Decompose `x` sampled at strictly increasing, finite times `t`.
    pub fn decompose(&self, t: &[f64], x: &[f64]) -> Decomposition {
        let mut residue = x.to_vec();
        let mut imfs = Vec::new();

        while imfs.len() < self.max_imfs {
            let (maxima, minima) = extrema(&residue);
            if maxima.len() < 2 || minima.len() < 2 {
                break;
            }
            let Some(imf) = self.sift(t, &residue) else {
                break;
            };
            for (r, m) in residue.iter_mut().zip(&imf) {
                *r -= m;
            }
            imfs.push(imf);
        }

        log::debug!("emd: extracted {} IMFs from {} points", imfs.len(), x.len());
        Decomposition { imfs, residue }
    }

    fn sift(&self, t: &[f64], x: &[f64]) -> Option<Vec<f64>> {
        let mut h = x.to_vec();
        for _ in 0..self.sift_iters {
            let Some(mean) = envelope_mean(t, &h) else {
                break;
            };
            let energy: f64 = h.iter().map(|v| v * v).sum();
            let change: f64 = mean.iter().map(|m| m * m).sum();
            for (hi, mi) in h.iter_mut().zip(&mean) {
                *hi -= mi;
            }
            if energy <= 0.0 || change / energy < self.sift_threshold {
                break;
            }
        }

        // An all-zero IMF leaves the residue unchanged; stop decomposing.
        h.iter().any(|v| *v != 0.0).then_some(h)
    }
}

impl Default for EmdDetrender {
    fn default() -> Self {
        Self::new(8, 10, 0.2)
    }
}

impl Detrender for EmdDetrender {
    fn name(&self) -> &'static str {
        "emd"
    }

    fn detrend(
        &self,
        time: &[f64],
        flux: &[f64],
        flux_err: Option<&[f64]>,
    ) -> Result<LightCurve, LightCurveError> {
        check_inputs(time, flux, flux_err)?;

        let mut idx = finite_indices(time, flux);
        idx.sort_by(|&a, &b| time[a].total_cmp(&time[b]));

        // Sifting needs strictly increasing times: repeated timestamps share one
        // grid sample (the first point seen) but every point gets the trend back.
        let mut t: Vec<f64> = Vec::with_capacity(idx.len());
        let mut x: Vec<f64> = Vec::with_capacity(idx.len());
        let mut slot = Vec::with_capacity(idx.len());
        for &i in &idx {
            if t.last() != Some(&time[i]) {
                t.push(time[i]);
                x.push(flux[i]);
            }
            slot.push(t.len() - 1);
        }
        if t.len() < idx.len() {
            log::warn!(
                "emd: {} points share a timestamp; fitting on the first of each",
                idx.len() - t.len()
            );
        }

        let decomposition = self.decompose(&t, &x);

        let mut out = vec![f64::NAN; time.len()];
        for (&i, &k) in idx.iter().zip(&slot) {
            out[i] = flux[i] - decomposition.residue[k];
        }
        assemble(time, out, flux_err)
    }
}

/// Interior local maxima and minima (plateaus count once, at their first sample).
fn extrema(h: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut maxima = Vec::new();
    let mut minima = Vec::new();
    for i in 1..h.len().saturating_sub(1) {
        if h[i] > h[i - 1] && h[i] >= h[i + 1] {
            maxima.push(i);
        } else if h[i] < h[i - 1] && h[i] <= h[i + 1] {
            minima.push(i);
        }
    }
    (maxima, minima)
}

fn envelope(t: &[f64], h: &[f64], interior: &[usize]) -> Option<CubicSpline> {
    let last = h.len() - 1;
    let mut knots = Vec::with_capacity(interior.len() + 2);
    knots.push(0);
    knots.extend_from_slice(interior);
    knots.push(last);

    let kt: Vec<f64> = knots.iter().map(|&i| t[i]).collect();
    let kh: Vec<f64> = knots.iter().map(|&i| h[i]).collect();
    CubicSpline::new(&kt, &kh)
}

fn envelope_mean(t: &[f64], h: &[f64]) -> Option<Vec<f64>> {
    let (maxima, minima) = extrema(h);
    if maxima.len() < 2 || minima.len() < 2 {
        return None;
    }
    let upper = envelope(t, h, &maxima)?;
    let lower = envelope(t, h, &minima)?;
    Some(t.iter().map(|&ti| 0.5 * (upper.evaluate(ti) + lower.evaluate(ti))).collect())
}
