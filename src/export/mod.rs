//! Export module for paginated CSV export operations
//!
//! This module turns a paged REST collection into CSV:
//! - Streaming exports that hold at most one page of records in memory
//! - Eager exports that fetch every page with bounded concurrency
//! - Progress tracking with real-time feedback
//! - Cooperative cancellation
//!
//! # Architecture
//!
//! 1. **CsvExportStream**: pull-based producer of CSV chunks, one page at a time
//! 2. **fetch_all**: eager aggregation of every page, in page order
//! 3. **csv**: the single CSV encoding codepath
//! 4. **ProgressTracker**: terminal progress bar fed by progress notifications
//!
//! These components are orchestrated by the **ExportCoordinator**, which
//! writes the stream to a sink or builds the eager document.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wpcsv::client::{RestClient, SiteConnection};
//! use wpcsv::export::{ExportCoordinator, ExportRequest};
//!
//! # async fn run() -> wpcsv::Result<()> {
//! let client = RestClient::new(SiteConnection::new("https://example.com"), Duration::from_secs(30))?;
//! let request = ExportRequest::new("posts", vec!["id".into(), "title.rendered".into()]);
//! let (csv, result) = ExportCoordinator::new(&client, request).collect_string().await?;
//! println!("{} records, {} bytes", result.records_exported, csv.len());
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod coordinator;
pub mod csv;
pub mod progress;
pub mod request;
pub mod sink;
pub mod streaming;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregate::{fetch_all, fetch_pages};
pub use coordinator::{ExportCoordinator, ExportResult};
pub use progress::ProgressTracker;
pub use request::{ExportProgress, ExportRequest, ProgressCallback};
pub use sink::{CSV_MIME_TYPE, default_filename};
pub use streaming::CsvExportStream;
