//! Export request and progress values.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Default number of records requested per page.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Default number of concurrent page requests in eager mode.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Progress snapshot emitted after each completed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportProgress {
    /// Page that just finished (1-based)
    pub current_page: u32,
    /// Total pages reported by the server
    pub total_pages: u32,
    /// Rows emitted so far
    pub records_processed: u64,
    /// Upper bound: `total_pages * per_page`
    pub estimated_total: u64,
}

/// Callback receiving [`ExportProgress`] notifications.
pub type ProgressCallback = Arc<dyn Fn(ExportProgress) + Send + Sync>;

/// Everything one export run needs besides the fetcher.
///
/// Built once per export and never mutated while the run is in progress.
#[derive(Clone)]
pub struct ExportRequest {
    /// Content type route segment (`posts`, `pages`, ...)
    pub content_type: String,
    /// Selected field names, in output column order
    pub fields: Vec<String>,
    /// Records per page
    pub per_page: u32,
    /// Concurrent requests in eager mode
    pub concurrency: usize,
    /// Cooperative cancellation signal
    pub cancel: Option<CancellationToken>,
    /// Progress subscriber
    pub progress: Option<ProgressCallback>,
}

impl ExportRequest {
    /// Create a request with default paging
    pub fn new(content_type: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            content_type: content_type.into(),
            fields,
            per_page: DEFAULT_PER_PAGE,
            concurrency: DEFAULT_CONCURRENCY,
            cancel: None,
            progress: None,
        }
    }

    /// Set records per page (at least 1)
    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Set eager-mode concurrency (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set cancellation token for this export
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Subscribe to per-page progress
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    pub(crate) fn notify(&self, progress: ExportProgress) {
        if let Some(ref callback) = self.progress {
            callback(progress);
        }
    }
}

impl fmt::Debug for ExportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportRequest")
            .field("content_type", &self.content_type)
            .field("fields", &self.fields)
            .field("per_page", &self.per_page)
            .field("concurrency", &self.concurrency)
            .field("cancellable", &self.cancel.is_some())
            .field("has_progress", &self.progress.is_some())
            .finish()
    }
}
