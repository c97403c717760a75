//! Extension points for collaborators outside the core.
//!
//! The core never writes files or draws anything itself. Callers register
//! exporters and a renderer in a [`Collaborators`] value and pass it to
//! [`LightCurve::export`] / [`LightCurve::render`]. Nothing is registered
//! globally.

use std::fmt;
use std::io::Write;

use crate::domain::LightCurve;
use crate::error::LightCurveError;

/// Serializes a light curve into one named format.
pub trait Exporter: Send + Sync {
    /// Format identifier this exporter answers to (e.g. `"csv"`).
    fn format(&self) -> &str;

    fn export(&self, lc: &LightCurve, out: &mut dyn Write) -> Result<(), LightCurveError>;
}

/// Produces a visualization of a light curve.
pub trait Renderer: Send + Sync {
    fn render(&self, lc: &LightCurve) -> Result<String, LightCurveError>;
}

/// Registered exporters and renderer.
#[derive(Default)]
pub struct Collaborators {
    exporters: Vec<Box<dyn Exporter>>,
    renderer: Option<Box<dyn Renderer>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an exporter. A later exporter for the same format replaces an earlier one.
    pub fn with_exporter(mut self, exporter: impl Exporter + 'static) -> Self {
        self.exporters.retain(|e| e.format() != exporter.format());
        self.exporters.push(Box::new(exporter));
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn exporter(&self, format: &str) -> Option<&dyn Exporter> {
        self.exporters
            .iter()
            .find(|e| e.format() == format)
            .map(|e| e.as_ref())
    }

    pub fn renderer(&self) -> Option<&dyn Renderer> {
        self.renderer.as_deref()
    }

    pub fn formats(&self) -> Vec<&str> {
        self.exporters.iter().map(|e| e.format()).collect()
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("formats", &self.formats())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountExporter;

    impl Exporter for CountExporter {
        fn format(&self) -> &str {
            "count"
        }

        fn export(&self, lc: &LightCurve, out: &mut dyn Write) -> Result<(), LightCurveError> {
            write!(out, "{}", lc.len())?;
            Ok(())
        }
    }

    #[test]
    fn registered_exporter_is_used() {
        let collaborators = Collaborators::new().with_exporter(CountExporter);
        let lc = LightCurve::new(vec![0.0, 1.0, 2.0], vec![1.0, 1.0, 1.0]).unwrap();
        let mut buf = Vec::new();
        lc.export("count", &collaborators, &mut buf).unwrap();
        assert_eq!(buf, b"3");

        assert!(matches!(
            lc.export("fits", &collaborators, &mut buf),
            Err(LightCurveError::NotImplemented { .. })
        ));
    }

    #[test]
    fn same_format_replaces_previous_exporter() {
        let collaborators = Collaborators::new()
            .with_exporter(CountExporter)
            .with_exporter(CountExporter);
        assert_eq!(collaborators.formats(), vec!["count"]);
    }
}
