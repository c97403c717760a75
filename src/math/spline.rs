//! Natural cubic spline interpolation.
//!
//! Used to draw the upper/lower envelopes through local extrema during EMD
//! sifting. Natural boundary conditions (zero second derivative at both ends)
//! keep the envelopes from overshooting at the series edges.
//!
//! Each segment is stored as `S(x) = a + b·dx + c·dx² + d·dx³` with
//! `dx = x - x_i`, solved with the Thomas algorithm in O(n).

#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    coeffs: Vec<[f64; 4]>,
}

impl CubicSpline {
    /// Build a spline through `(x, y)`.
    ///
    /// Returns `None` unless the lengths match, there are at least two knots, and
    /// `x` is strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> Option<Self> {
        let n = x.len();
        if n != y.len() || n < 2 || x.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

        let mut alpha = vec![0.0; n];
        for i in 1..n - 1 {
            alpha[i] = (3.0 / h[i]) * (y[i + 1] - y[i]) - (3.0 / h[i - 1]) * (y[i] - y[i - 1]);
        }

        let mut l = vec![1.0; n];
        let mut mu = vec![0.0; n];
        let mut z = vec![0.0; n];
        for i in 1..n - 1 {
            l[i] = 2.0 * (x[i + 1] - x[i - 1]) - h[i - 1] * mu[i - 1];
            mu[i] = h[i] / l[i];
            z[i] = (alpha[i] - h[i - 1] * z[i - 1]) / l[i];
        }

        let mut c = vec![0.0; n];
        let mut coeffs = vec![[0.0; 4]; n - 1];
        for j in (0..n - 1).rev() {
            c[j] = z[j] - mu[j] * c[j + 1];
            let b = (y[j + 1] - y[j]) / h[j] - h[j] * (c[j + 1] + 2.0 * c[j]) / 3.0;
            let d = (c[j + 1] - c[j]) / (3.0 * h[j]);
            coeffs[j] = [y[j], b, c[j], d];
        }

        Some(Self {
            x: x.to_vec(),
            coeffs,
        })
    }

    /// Evaluate at `x`. Outside the knot range the end segments are extended.
    pub fn evaluate(&self, x: f64) -> f64 {
        let last = self.coeffs.len() - 1;
        let seg = self.x.partition_point(|&k| k <= x).saturating_sub(1).min(last);
        let dx = x - self.x[seg];
        let [a, b, c, d] = self.coeffs[seg];
        a + dx * (b + dx * (c + dx * d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_knots() {
        let x = [0.0, 1.0, 2.5, 4.0];
        let y = [1.0, -2.0, 0.5, 3.0];
        let s = CubicSpline::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((s.evaluate(*xi) - yi).abs() < 1e-12);
        }
    }

    #[test]
    fn reproduces_straight_line() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v - 1.0).collect();
        let s = CubicSpline::new(&x, &y).unwrap();
        assert!((s.evaluate(1.7) - 2.4).abs() < 1e-12);
    }

    #[test]
    fn rejects_unsorted_knots() {
        assert!(CubicSpline::new(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0]).is_none());
        assert!(CubicSpline::new(&[0.0], &[0.0]).is_none());
    }
}
