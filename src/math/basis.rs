//! Stable polynomial basis for trend fitting.
//!
//! Raw monomials `t^k` on mission timestamps (values in the thousands of days)
//! produce hopelessly ill-conditioned design matrices. We therefore:
//!
//! - map time onto `[-1, 1]` with an affine [`AxisScale`]
//! - evaluate Legendre polynomials `P_k(x)` there, via the three-term recurrence
//!   `(k+1) P_{k+1} = (2k+1) x P_k - k P_{k-1}`

/// Affine map from a data range onto `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    center: f64,
    half_span: f64,
}

impl AxisScale {
    /// Build the scale from the finite values in `values`.
    ///
    /// A degenerate range (single value, or nothing finite) maps everything to 0.
    pub fn from_values(values: &[f64]) -> Self {
        let (lo, hi) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        if !(lo.is_finite() && hi.is_finite()) || hi <= lo {
            let center = if lo.is_finite() { lo } else { 0.0 };
            return Self {
                center,
                half_span: 1.0,
            };
        }

        Self {
            center: 0.5 * (lo + hi),
            half_span: 0.5 * (hi - lo),
        }
    }

    pub fn apply(&self, v: f64) -> f64 {
        (v - self.center) / self.half_span
    }
}

/// Fill `out` with `P_0(x) .. P_{out.len()-1}(x)`.
pub fn fill_legendre_row(x: f64, out: &mut [f64]) {
    if out.is_empty() {
        return;
    }
    out[0] = 1.0;
    if out.len() > 1 {
        out[1] = x;
    }
    for k in 1..out.len().saturating_sub(1) {
        let kf = k as f64;
        out[k + 1] = ((2.0 * kf + 1.0) * x * out[k] - kf * out[k - 1]) / (kf + 1.0);
    }
}

/// Evaluate `Σ c_k P_k(x)`.
pub fn eval_legendre(coeffs: &[f64], x: f64) -> f64 {
    let mut row = vec![0.0; coeffs.len()];
    fill_legendre_row(x, &mut row);
    row.iter().zip(coeffs).map(|(p, c)| p * c).sum()
}

/// Evaluate a monomial polynomial `Σ c_k x^k` (Horner).
pub fn eval_monomial(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Derivative of `Σ c_k x^k`.
pub fn eval_monomial_derivative(coeffs: &[f64], x: f64) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .fold(0.0, |acc, (k, &c)| acc * x + k as f64 * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legendre_matches_closed_forms() {
        let x = 0.3;
        let mut row = [0.0; 4];
        fill_legendre_row(x, &mut row);
        assert!((row[0] - 1.0).abs() < 1e-15);
        assert!((row[1] - x).abs() < 1e-15);
        assert!((row[2] - 0.5 * (3.0 * x * x - 1.0)).abs() < 1e-15);
        assert!((row[3] - 0.5 * (5.0 * x * x * x - 3.0 * x)).abs() < 1e-15);
    }

    #[test]
    fn axis_scale_maps_range_onto_unit_interval() {
        let s = AxisScale::from_values(&[120.0, f64::NAN, 130.0, 125.0]);
        assert!((s.apply(120.0) + 1.0).abs() < 1e-12);
        assert!((s.apply(130.0) - 1.0).abs() < 1e-12);
        assert!(s.apply(125.0).abs() < 1e-12);
    }

    #[test]
    fn monomial_derivative() {
        // p(x) = 1 + 2x + 3x^2, p'(x) = 2 + 6x
        let c = [1.0, 2.0, 3.0];
        assert!((eval_monomial(&c, 2.0) - 17.0).abs() < 1e-12);
        assert!((eval_monomial_derivative(&c, 2.0) - 14.0).abs() < 1e-12);
    }
}
