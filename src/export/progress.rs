//! Progress display for export operations
//!
//! Renders [`ExportProgress`] notifications as a terminal progress bar,
//! giving users real-time feedback on long exports.

use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use super::request::{ExportProgress, ProgressCallback};

/// Progress tracker for export operations
///
/// Tracks record progress and displays a bar with page position and speed.
pub struct ProgressTracker {
    /// Start time of the operation
    start_time: Instant,
    /// Progress bar (optional, can be disabled)
    bar: Option<ProgressBar>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `enable_bar` - Whether to display a progress bar
    ///
    /// # Returns
    /// * `Self` - New progress tracker instance
    pub fn new(enable_bar: bool) -> Self {
        let bar = enable_bar.then(|| {
            // Length is unknown until page 1 arrives
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} records {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        });

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    /// Update the display from a progress notification
    pub fn update(&self, progress: &ExportProgress) {
        if let Some(ref bar) = self.bar {
            bar.set_length(progress.estimated_total.max(progress.records_processed));
            bar.set_position(progress.records_processed);

            let elapsed = self.start_time.elapsed().as_secs_f64();
            let speed = if elapsed > 0.0 {
                progress.records_processed as f64 / elapsed
            } else {
                0.0
            };
            bar.set_message(format!(
                "page {}/{} ({:.0} records/sec)",
                progress.current_page, progress.total_pages, speed
            ));
        }
    }

    /// Wrap this tracker as an export progress callback
    pub fn callback(self: &Arc<Self>) -> ProgressCallback {
        let tracker = Arc::clone(self);
        Arc::new(move |progress| tracker.update(&progress))
    }

    /// Finish and clear the progress bar
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}
