//! Formatted terminal output.
//!
//! Formatting lives here so the detrenders stay free of presentation and
//! output changes stay local (the tests below pin the layout).

use crate::report::{RunSummary, mission_time_to_datetime};

/// Format one run summary (input, method, time span, noise before/after).
pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("=== lcd - light curve detrend ===\n");
    out.push_str(&format!("Input: {}\n", summary.label));
    out.push_str(&format!("Flux: {}\n", summary.flux_type));
    out.push_str(&format!(
        "Method: {} ({})\n",
        summary.method.display_name(),
        summary.method
    ));
    out.push_str(&format!(
        "Points: read={} | used={} | finite out={}\n",
        summary.n_read, summary.n_used, summary.n_finite_out
    ));

    if summary.time_min.is_finite() && summary.time_max.is_finite() {
        out.push_str(&format!(
            "Time: [{:.4}, {:.4}] | span={:.3}d\n",
            summary.time_min,
            summary.time_max,
            summary.time_max - summary.time_min
        ));
        if let (Some(start), Some(end)) = (
            mission_time_to_datetime(summary.time_min, summary.time_offset),
            mission_time_to_datetime(summary.time_max, summary.time_offset),
        ) {
            out.push_str(&format!(
                "Dates: {} .. {} UTC\n",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            ));
        }
    } else {
        out.push_str("Time: n/a\n");
    }

    out.push_str(&format!(
        "Robust sigma: before={} after={}",
        fmt_opt(summary.sigma_before),
        fmt_opt(summary.sigma_after)
    ));
    if let Some(ratio) = summary.noise_ratio() {
        out.push_str(&format!(" (ratio {ratio:.3})"));
    }
    out.push('\n');

    out
}

/// Format the flux columns available in one input.
pub fn format_flux_types(label: &str, flux_types: &[String]) -> String {
    if flux_types.is_empty() {
        return format!("{label}: no flux columns\n");
    }
    format!("{label}: {}\n", flux_types.join(", "))
}

fn fmt_opt(v: f64) -> String {
    if v.is_finite() { format!("{v:.6}") } else { "n/a".to_string() }
}
