//! WordPress REST to CSV export library
//!
//! This library provides the core functionality behind the `wpcsv` tool. It
//! can be used on its own to export any paged JSON collection as CSV.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `client`: Paged REST fetching
//! - `config`: Configuration management
//! - `error`: Error types and handling
//! - `export`: Streaming and eager CSV export
//! - `formatter`: Table output for the terminal
//! - `ingest`: Reading CSV files back
//! - `record`: Record flattening and field inference
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use wpcsv::client::{RestClient, SiteConnection};
//! use wpcsv::export::{ExportCoordinator, ExportRequest};
//! use wpcsv::record::sample_fields;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let site = SiteConnection::new("https://example.com");
//!     let client = RestClient::new(site, Duration::from_secs(30))?;
//!
//!     let fields = sample_fields(&client, "posts").await?;
//!     let request = ExportRequest::new("posts", fields).with_concurrency(4);
//!     let csv = ExportCoordinator::new(&client, request).export_eager().await?;
//!
//!     println!("{}", csv);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod formatter;
pub mod ingest;
pub mod record;

// Re-export commonly used types
pub use client::{Page, PageFetcher, RestClient, SiteConnection};
pub use config::Config;
pub use error::{ExportError, Result};
pub use export::{CsvExportStream, ExportCoordinator, ExportRequest, ExportResult, fetch_all};
pub use record::{FlatRecord, flatten, infer_fields};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
