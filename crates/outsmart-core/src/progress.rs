//! Progress reporting hook for round collection.
//!
//! The referee reports how far collection has got so a UI can show a
//! progress bar. Reports are observational only; nothing reads them back.

use tracing::info;

/// Receives progress updates while a round is collected and settled.
pub trait ProgressSink {
    /// `fraction` is in `[0.0, 1.0]`; `status` is human-readable.
    fn progress(&mut self, fraction: f64, status: &str);
}

/// A sink that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _fraction: f64, _status: &str) {}
}

/// A sink that logs every update at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn progress(&mut self, fraction: f64, status: &str) {
        info!(percent = format!("{:.0}", fraction * 100.0), "{status}");
    }
}

impl<F: FnMut(f64, &str)> ProgressSink for F {
    fn progress(&mut self, fraction: f64, status: &str) {
        self(fraction, status);
    }
}
