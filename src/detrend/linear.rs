//! Linear detrending: subtract a weighted least-squares straight line in time.

use crate::detrend::polynomial::subtract_trend;
use crate::detrend::{Detrender, assemble, base_weights, check_inputs, finite_indices};
use crate::domain::LightCurve;
use crate::error::LightCurveError;
use crate::fit::{FitOptions, fit_polynomial};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearDetrender {
    fit: FitOptions,
}

impl LinearDetrender {
    pub fn new(fit: FitOptions) -> Self {
        Self { fit }
    }
}

impl Detrender for LinearDetrender {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn detrend(
        &self,
        time: &[f64],
        flux: &[f64],
        flux_err: Option<&[f64]>,
    ) -> Result<LightCurve, LightCurveError> {
        check_inputs(time, flux, flux_err)?;
        let idx = finite_indices(time, flux);
        if idx.is_empty() {
            return assemble(time, vec![f64::NAN; time.len()], flux_err);
        }
        let t: Vec<f64> = idx.iter().map(|&i| time[i]).collect();
        let f: Vec<f64> = idx.iter().map(|&i| flux[i]).collect();
        let w = base_weights(flux_err, &idx);

        let trend = fit_polynomial(self.name(), &t, &f, &w, 1, &self.fit)?;
        assemble(time, subtract_trend(time, flux, &trend), flux_err)
    }
}
