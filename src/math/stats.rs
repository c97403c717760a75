//! Summary statistics over finite values.
//!
//! Non-finite inputs (NaN gaps are common in spacecraft photometry) are skipped
//! by every function here. `None` means nothing finite was left.

/// Scale factor turning a MAD into a Gaussian-equivalent sigma.
pub const MAD_TO_SIGMA: f64 = 1.4826;

pub fn mean(data: &[f64]) -> Option<f64> {
    let (sum, n) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Population standard deviation.
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let m = mean(data)?;
    let (ss, n) = data
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + (v - m) * (v - m), n + 1));
    Some((ss / n as f64).sqrt())
}

pub fn median(data: &[f64]) -> Option<f64> {
    let mut v: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    median_mut(&mut v)
}

/// Median of a scratch buffer (reorders it). Assumes finite values.
pub fn median_mut(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

pub fn median_absolute_deviation(data: &[f64]) -> Option<f64> {
    let med = median(data)?;
    let mut deviations: Vec<f64> = data
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| (v - med).abs())
        .collect();
    median_mut(&mut deviations)
}

/// `1.4826 * MAD`.
pub fn robust_sigma(data: &[f64]) -> Option<f64> {
    median_absolute_deviation(data).map(|mad| MAD_TO_SIGMA * mad)
}

/// Linear interpolation of `(xs, ys)` at `x`, clamped to the end values.
///
/// `xs` must be sorted ascending and have the same length as `ys`.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> Option<f64> {
    let (first, last) = (*xs.first()?, *xs.last()?);
    if x <= first {
        return ys.first().copied();
    }
    if x >= last {
        return ys.last().copied();
    }
    let hi = xs.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let span = xs[hi] - xs[lo];
    if span <= 0.0 {
        return Some(ys[lo]);
    }
    let u = (x - xs[lo]) / span;
    Some(ys[lo] + u * (ys[hi] - ys[lo]))
}
