//! Progress-callback trait for per-dashboard extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the orchestrator works through the team/dashboard mapping.
//!
//! # Example
//!
//! ```rust
//! use dashboard_stitch::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     stitched: AtomicUsize,
//! }
//!
//! impl ExtractionProgressCallback for CountingCallback {
//!     fn on_dashboard_complete(&self, team: &str, dashboard: &str, png_len: usize) {
//!         self.stitched.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{team} / {dashboard}: {png_len} bytes");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { stitched: AtomicUsize::new(0) });
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ExtractionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the orchestrator as it processes each dashboard.
///
/// Dashboards are processed one at a time, but the extraction may run on a
/// blocking-pool thread, hence `Send + Sync`. All methods default to no-ops.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first dashboard is opened.
    ///
    /// # Arguments
    /// * `total_dashboards`: dashboards across all teams
    fn on_extraction_start(&self, total_dashboards: usize) {
        let _ = total_dashboards;
    }

    /// Called just before a dashboard's PDF is opened.
    fn on_dashboard_start(&self, team: &str, dashboard: &str) {
        let _ = (team, dashboard);
    }

    /// Called when a dashboard has been stitched and encoded.
    ///
    /// # Arguments
    /// * `png_len`: byte length of the encoded PNG
    fn on_dashboard_complete(&self, team: &str, dashboard: &str, png_len: usize) {
        let _ = (team, dashboard, png_len);
    }

    /// Called when a dashboard fails.
    ///
    /// Under [`crate::config::FailurePolicy::Abort`] this is the last event.
    fn on_dashboard_error(&self, team: &str, dashboard: &str, error: &str) {
        let _ = (team, dashboard, error);
    }

    /// Called once after every dashboard has been attempted.
    fn on_extraction_complete(&self, total_dashboards: usize, success_count: usize) {
        let _ = (total_dashboards, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl ExtractionProgressCallback for RecordingCallback {
        fn on_dashboard_start(&self, team: &str, dashboard: &str) {
            self.events.lock().unwrap().push(format!("start {team}/{dashboard}"));
        }

        fn on_dashboard_error(&self, team: &str, dashboard: &str, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {team}/{dashboard}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_extraction_start(2);
        cb.on_dashboard_start("Team", "Board");
        cb.on_dashboard_complete("Team", "Board", 42);
        cb.on_dashboard_error("Team", "Other", "blank page");
        cb.on_extraction_complete(2, 1);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let cb = RecordingCallback::default();
        cb.on_dashboard_start("A", "x");
        cb.on_dashboard_complete("A", "x", 10);
        cb.on_dashboard_error("A", "y", "missing");
        assert_eq!(
            *cb.events.lock().unwrap(),
            vec!["start A/x".to_string(), "error A/y: missing".to_string()]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_extraction_start(1);
    }
}
