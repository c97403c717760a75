//! First-difference detrending.
//!
//! `out[0] = flux[0]` and `out[i] = flux[i] - flux[i-1]` for `i > 0`, i.e. the
//! series is differenced against itself shifted right with a leading zero. A
//! crude high-pass filter: it removes any slow trend but amplifies
//! point-to-point noise by roughly `sqrt(2)`.

use crate::detrend::{Detrender, assemble, check_inputs};
use crate::domain::LightCurve;
use crate::error::LightCurveError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirstDifferenceDetrender;

impl Detrender for FirstDifferenceDetrender {
    fn name(&self) -> &'static str {
        "first_difference"
    }

    fn detrend(
        &self,
        time: &[f64],
        flux: &[f64],
        flux_err: Option<&[f64]>,
    ) -> Result<LightCurve, LightCurveError> {
        check_inputs(time, flux, flux_err)?;

        let out: Vec<f64> = flux
            .iter()
            .enumerate()
            .map(|(i, &f)| if i == 0 { f } else { f - flux[i - 1] })
            .collect();

        assemble(time, out, flux_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_differences_keep_first_value() {
        let out = FirstDifferenceDetrender
            .detrend(&[0.0, 1.0, 2.0, 3.0], &[10.0, 12.0, 15.0, 11.0], None)
            .unwrap();
        assert_eq!(out.flux(), &[10.0, 2.0, 3.0, -4.0]);
        assert_eq!(out.time(), &[0.0, 1.0, 2.0, 3.0]);
        assert!(out.flux_err().is_none());
    }

    #[test]
    fn empty_and_single_point_series() {
        let empty = FirstDifferenceDetrender.detrend(&[], &[], None).unwrap();
        assert!(empty.is_empty());

        let one = FirstDifferenceDetrender.detrend(&[5.0], &[7.5], Some(&[0.1])).unwrap();
        assert_eq!(one.flux(), &[7.5]);
        assert_eq!(one.flux_err().unwrap(), &[0.1]);
    }

    #[test]
    fn nan_gap_poisons_neighbouring_differences_only() {
        let out = FirstDifferenceDetrender
            .detrend(&[0.0, 1.0, 2.0, 3.0], &[1.0, f64::NAN, 3.0, 4.0], None)
            .unwrap();
        assert!(out.flux()[1].is_nan());
        assert!(out.flux()[2].is_nan());
        assert_eq!(out.flux()[3], 1.0);
    }
}
