//! Reporting utilities: run summaries and their terminal formatting.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::domain::{DetrendMethod, LightCurve};

pub mod format;

pub use format::*;

/// Julian Date of 2000-01-01T00:00.
const JD_2000: f64 = 2_451_544.5;

/// What a single detrend run did to one light curve.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub label: String,
    pub flux_type: String,
    pub method: DetrendMethod,
    pub n_read: usize,
    pub n_used: usize,
    pub n_finite_out: usize,
    pub time_min: f64,
    pub time_max: f64,
    /// Offset added to the time column to obtain a Julian Date.
    pub time_offset: f64,
    pub sigma_before: f64,
    pub sigma_after: f64,
}

impl RunSummary {
    /// Compare the light curve as read, as fed to the detrender, and as returned.
    pub fn new(
        label: impl Into<String>,
        flux_type: impl Into<String>,
        method: DetrendMethod,
        time_offset: f64,
        read: &LightCurve,
        input: &LightCurve,
        output: &LightCurve,
    ) -> Self {
        let before = input.stats();
        let after = output.stats();
        Self {
            label: label.into(),
            flux_type: flux_type.into(),
            method,
            n_read: read.len(),
            n_used: input.len(),
            n_finite_out: after.n_finite,
            time_min: before.time_min,
            time_max: before.time_max,
            time_offset,
            sigma_before: before.robust_sigma,
            sigma_after: after.robust_sigma,
        }
    }

    /// Robust-sigma ratio after/before; `None` when either side is undefined.
    pub fn noise_ratio(&self) -> Option<f64> {
        let ratio = self.sigma_after / self.sigma_before;
        (self.sigma_before > 0.0 && ratio.is_finite()).then_some(ratio)
    }
}

/// Calendar date-time (UTC) of a mission time value.
///
/// `time + offset` must be a Julian Date; Kepler BKJD uses an offset of 2454833.
pub fn mission_time_to_datetime(time: f64, offset: f64) -> Option<NaiveDateTime> {
    let days = time + offset - JD_2000;
    if !days.is_finite() {
        return None;
    }
    let millis = (days * 86_400_000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1)?.and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(Duration::try_milliseconds(millis as i64)?)
}
