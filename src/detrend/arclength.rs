//! Arc-length detrending (self-flat-fielding).
//!
//! Pointing jitter drags the target across pixels of different sensitivity, so
//! the measured flux becomes a function of where the centroid sits along its
//! (roughly one-dimensional) track. Per time window we:
//!
//! 1. rotate the centroid track onto its principal axes `(x', y')`
//! 2. fit `y' = p(x')` and measure the arc length `s` along that curve
//! 3. normalize flux by its median, bin it by `s` and take bin medians
//! 4. interpolate the binned medians at every `s` and divide them out
//!
//! Without centroids the path is the time axis itself (`s = t - t0`), which
//! reduces the correction to a binned-median trend in time.
//!
//! Points with non-finite time, flux or centroid are excluded and come out NaN.

use nalgebra::{DMatrix, DVector, Matrix2};

use crate::detrend::{CentroidTrack, Detrender, assemble, check_inputs};
use crate::domain::LightCurve;
use crate::error::LightCurveError;
use crate::math::{eval_monomial_derivative, interp_linear, median, solve_least_squares};

/// Integration grid resolution for the arc-length integral.
const ARC_GRID: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct ArcLengthDetrender<'a> {
    windows: usize,
    bins: usize,
    centroid_degree: usize,
    centroids: Option<CentroidTrack<'a>>,
}

impl ArcLengthDetrender<'static> {
    pub fn new(windows: usize, bins: usize, centroid_degree: usize) -> Self {
        Self {
            windows: windows.max(1),
            bins: bins.max(1),
            centroid_degree,
            centroids: None,
        }
    }
}

impl Default for ArcLengthDetrender<'static> {
    fn default() -> Self {
        Self::new(1, 15, 3)
    }
}

impl<'a> ArcLengthDetrender<'a> {
    /// Use a centroid track as the auxiliary path.
    pub fn with_centroids<'b>(self, centroids: Option<CentroidTrack<'b>>) -> ArcLengthDetrender<'b> {
        ArcLengthDetrender {
            windows: self.windows,
            bins: self.bins,
            centroid_degree: self.centroid_degree,
            centroids,
        }
    }

    fn usable(&self, time: &[f64], flux: &[f64], i: usize) -> bool {
        let centroid_ok = self
            .centroids
            .map(|c| c.col[i].is_finite() && c.row[i].is_finite())
            .unwrap_or(true);
        time[i].is_finite() && flux[i].is_finite() && centroid_ok
    }

    /// Arc length of each selected point along the auxiliary path.
    fn arc_lengths(&self, time: &[f64], idx: &[usize]) -> Result<Vec<f64>, LightCurveError> {
        match self.centroids {
            Some(c) => {
                let col: Vec<f64> = idx.iter().map(|&i| c.col[i]).collect();
                let row: Vec<f64> = idx.iter().map(|&i| c.row[i]).collect();
                centroid_arc_lengths(&col, &row, self.centroid_degree)
            }
            None => {
                let t0 = idx.iter().map(|&i| time[i]).fold(f64::INFINITY, f64::min);
                Ok(idx.iter().map(|&i| time[i] - t0).collect())
            }
        }
    }

    /// Multiplicative correction for one window.
    fn window_correction(&self, flux: &[f64], idx: &[usize], s: &[f64]) -> Vec<f64> {
        let values: Vec<f64> = idx.iter().map(|&i| flux[i]).collect();
        let level = match median(&values) {
            Some(m) if m.is_finite() && m != 0.0 => m,
            _ => {
                log::warn!("arclength: window median flux is zero or undefined; leaving window uncorrected");
                return vec![1.0; idx.len()];
            }
        };
        let norm: Vec<f64> = values.iter().map(|v| v / level).collect();

        let (s_min, s_max) = s
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span = s_max - s_min;
        let n_bins = self.bins.min(idx.len()).max(1);

        let mut bin_s: Vec<Vec<f64>> = vec![Vec::new(); n_bins];
        let mut bin_f: Vec<Vec<f64>> = vec![Vec::new(); n_bins];
        for (&si, &fi) in s.iter().zip(&norm) {
            let b = if span > 0.0 {
                (((si - s_min) / span) * n_bins as f64).floor() as usize
            } else {
                0
            };
            let b = b.min(n_bins - 1);
            bin_s[b].push(si);
            bin_f[b].push(fi);
        }

        let mut centers = Vec::with_capacity(n_bins);
        let mut levels = Vec::with_capacity(n_bins);
        for (bs, bf) in bin_s.iter().zip(&bin_f) {
            if let (Some(c), Some(l)) = (median(bs), median(bf)) {
                centers.push(c);
                levels.push(l);
            }
        }

        s.iter()
            .map(|&si| match interp_linear(&centers, &levels, si) {
                Some(c) if c.is_finite() && c > 0.0 => c,
                _ => 1.0,
            })
            .collect()
    }
}

impl Detrender for ArcLengthDetrender<'_> {
    fn name(&self) -> &'static str {
        "arclength"
    }

    fn detrend(
        &self,
        time: &[f64],
        flux: &[f64],
        flux_err: Option<&[f64]>,
    ) -> Result<LightCurve, LightCurveError> {
        check_inputs(time, flux, flux_err)?;
        if let Some(c) = self.centroids {
            for (column, len) in [("centroid_col", c.col.len()), ("centroid_row", c.row.len())] {
                if len != time.len() {
                    return Err(LightCurveError::ShapeMismatch {
                        column,
                        expected: time.len(),
                        actual: len,
                    });
                }
            }
        }

        let idx: Vec<usize> = (0..time.len()).filter(|&i| self.usable(time, flux, i)).collect();
        let mut out = vec![f64::NAN; time.len()];

        for window in split_windows(time, &idx, self.windows) {
            if window.is_empty() {
                continue;
            }
            let s = self.arc_lengths(time, &window)?;
            let correction = self.window_correction(flux, &window, &s);
            for (&i, c) in window.iter().zip(correction) {
                out[i] = flux[i] / c;
            }
        }

        log::debug!(
            "arclength: corrected {} of {} points ({} path)",
            idx.len(),
            time.len(),
            if self.centroids.is_some() { "centroid" } else { "time" }
        );

        assemble(time, out, flux_err)
    }
}

/// Partition `idx` into `windows` equal spans of time.
fn split_windows(time: &[f64], idx: &[usize], windows: usize) -> Vec<Vec<usize>> {
    let (t_min, t_max) = idx
        .iter()
        .map(|&i| time[i])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| (lo.min(t), hi.max(t)));
    let span = t_max - t_min;

    let mut out = vec![Vec::new(); windows];
    for &i in idx {
        let w = if span > 0.0 {
            (((time[i] - t_min) / span) * windows as f64).floor() as usize
        } else {
            0
        };
        out[w.min(windows - 1)].push(i);
    }
    out
}

/// Arc length of each centroid along a polynomial fitted through the track
/// in its principal-axis frame.
fn centroid_arc_lengths(col: &[f64], row: &[f64], degree: usize) -> Result<Vec<f64>, LightCurveError> {
    let n = col.len() as f64;
    let mc = col.iter().sum::<f64>() / n;
    let mr = row.iter().sum::<f64>() / n;

    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (c, r) in col.iter().zip(row) {
        let (dc, dr) = (c - mc, r - mr);
        sxx += dc * dc;
        sxy += dc * dr;
        syy += dr * dr;
    }
    let eigen = Matrix2::new(sxx, sxy, sxy, syy).symmetric_eigen();
    let (major, minor) = if eigen.eigenvalues[0] >= eigen.eigenvalues[1] {
        (eigen.eigenvectors.column(0).into_owned(), eigen.eigenvectors.column(1).into_owned())
    } else {
        (eigen.eigenvectors.column(1).into_owned(), eigen.eigenvectors.column(0).into_owned())
    };

    let xs: Vec<f64> = col
        .iter()
        .zip(row)
        .map(|(c, r)| (c - mc) * major[0] + (r - mr) * major[1])
        .collect();
    let ys: Vec<f64> = col
        .iter()
        .zip(row)
        .map(|(c, r)| (c - mc) * minor[0] + (r - mr) * minor[1])
        .collect();

    let (x_min, x_max) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let half = 0.5 * (x_max - x_min);
    if !half.is_finite() || half <= 0.0 {
        // The centroid never moved: every point sits at the same place on the path.
        return Ok(vec![0.0; xs.len()]);
    }
    let center = 0.5 * (x_max + x_min);

    // Fit y' = q(u) with u = (x' - center) / half on [-1, 1].
    let degree = degree.min(xs.len().saturating_sub(1));
    let p = degree + 1;
    let mut design = DMatrix::<f64>::zeros(xs.len(), p);
    for (i, &x) in xs.iter().enumerate() {
        let u = (x - center) / half;
        let mut v = 1.0;
        for j in 0..p {
            design[(i, j)] = v;
            v *= u;
        }
    }
    let coeffs = solve_least_squares(&design, &DVector::from_column_slice(&ys)).ok_or_else(|| {
        LightCurveError::FitFailed {
            method: "arclength",
            reason: "centroid track polynomial did not converge".to_string(),
        }
    })?;
    let coeffs: Vec<f64> = coeffs.iter().copied().collect();

    // Cumulative trapezoid of sqrt(1 + (dy'/dx')^2) over a uniform grid in u.
    // Since dx' = half·du, ds = sqrt(half² + q'(u)²) du.
    let du = 2.0 / (ARC_GRID - 1) as f64;
    let grid_u: Vec<f64> = (0..ARC_GRID).map(|k| -1.0 + k as f64 * du).collect();
    let integrand: Vec<f64> = grid_u
        .iter()
        .map(|&u| {
            let dq = eval_monomial_derivative(&coeffs, u);
            (half * half + dq * dq).sqrt()
        })
        .collect();
    let mut grid_s = vec![0.0; ARC_GRID];
    for k in 1..ARC_GRID {
        grid_s[k] = grid_s[k - 1] + 0.5 * du * (integrand[k - 1] + integrand[k]);
    }

    Ok(xs
        .iter()
        .map(|&x| interp_linear(&grid_u, &grid_s, (x - center) / half).unwrap_or(0.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::robust_sigma;

    /// Sawtooth roll along a curved track, with flux depending on position.
    fn rolling_target(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>) {
        let time: Vec<f64> = (0..n).map(|i| 2000.0 + i as f64 * 0.0204).collect();
        let pos: Vec<f64> = time
            .iter()
            .map(|t| 2.0 * ((t - 2000.0) / 0.25).fract() - 1.0)
            .collect();
        let col: Vec<f64> = pos.iter().map(|x| 500.0 + x).collect();
        let row: Vec<f64> = pos.iter().map(|x| 300.0 + 0.3 * x * x).collect();
        let flux: Vec<f64> = pos.iter().map(|x| 1000.0 * (1.0 - 0.01 * x * x + 0.004 * x)).collect();
        (time, flux, col, row)
    }

    #[test]
    fn removes_centroid_correlated_systematic() {
        let (time, flux, col, row) = rolling_target(1000);
        let track = CentroidTrack { col: &col, row: &row };

        let out = ArcLengthDetrender::new(1, 20, 3)
            .with_centroids(Some(track))
            .detrend(&time, &flux, None)
            .unwrap();

        let before = robust_sigma(&flux).unwrap();
        let after = robust_sigma(out.flux()).unwrap();
        assert!(after < 0.2 * before, "before={before} after={after}");
        assert_eq!(out.len(), time.len());
    }

    #[test]
    fn arc_length_is_monotonic_along_track() {
        let x: Vec<f64> = (0..50).map(|i| -1.0 + i as f64 * 0.04).collect();
        let col: Vec<f64> = x.iter().map(|v| 10.0 + v).collect();
        let row: Vec<f64> = x.iter().map(|v| 20.0 + 0.2 * v * v).collect();

        let s = centroid_arc_lengths(&col, &row, 3).unwrap();
        let increasing = s.windows(2).all(|w| w[1] > w[0]);
        let decreasing = s.windows(2).all(|w| w[1] < w[0]);
        assert!(increasing || decreasing);

        // A curved path is longer than its chord.
        let total = (s[49] - s[0]).abs();
        assert!(total > 1.96);
    }

    #[test]
    fn without_centroids_flattens_slow_time_trend() {
        let time: Vec<f64> = (0..600).map(|i| i as f64 * 0.01).collect();
        let flux: Vec<f64> = time.iter().map(|t| 500.0 + 20.0 * t).collect();

        let out = ArcLengthDetrender::new(1, 30, 3).detrend(&time, &flux, None).unwrap();
        let before = robust_sigma(&flux).unwrap();
        let after = robust_sigma(out.flux()).unwrap();
        assert!(after < 0.1 * before, "before={before} after={after}");
    }

    #[test]
    fn static_centroid_leaves_flux_unchanged_up_to_level() {
        let time = [0.0, 1.0, 2.0, 3.0];
        let flux = [10.0, 10.0, 10.0, 10.0];
        let col = [5.0; 4];
        let row = [6.0; 4];

        let out = ArcLengthDetrender::default()
            .with_centroids(Some(CentroidTrack { col: &col, row: &row }))
            .detrend(&time, &flux, None)
            .unwrap();
        assert_eq!(out.flux(), &flux);
    }

    #[test]
    fn non_finite_centroid_points_come_out_nan() {
        let (time, flux, mut col, row) = rolling_target(200);
        col[17] = f64::NAN;

        let out = ArcLengthDetrender::default()
            .with_centroids(Some(CentroidTrack { col: &col, row: &row }))
            .detrend(&time, &flux, None)
            .unwrap();
        assert!(out.flux()[17].is_nan());
        assert!(out.flux()[18].is_finite());
    }

    #[test]
    fn windows_are_equal_time_spans() {
        let time = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let idx: Vec<usize> = (0..6).collect();
        let w = split_windows(&time, &idx, 2);
        assert_eq!(w, vec![vec![0, 1, 2], vec![3, 4, 5]]);
    }
}
