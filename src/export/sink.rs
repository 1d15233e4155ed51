//! Output file helpers for CSV exports.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs::File;
use tokio::io::BufWriter;

use crate::error::{ExportError, Result};

/// MIME type of the produced artifact
pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";

/// Default filename prefix
pub const DEFAULT_FILENAME_PREFIX: &str = "wordpress-export";

/// `<prefix>-<content_type>-<YYYY-MM-DD>.csv`
pub fn default_filename(prefix: &str, content_type: &str, date: NaiveDate) -> String {
    let content_type: String = content_type
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("{}-{}-{}.csv", prefix, content_type, date.format("%Y-%m-%d"))
}

/// Resolve the output path, placing the default filename in `dir` when given
pub fn output_path(
    explicit: Option<&Path>,
    dir: Option<&Path>,
    prefix: &str,
    content_type: &str,
    date: NaiveDate,
) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let name = default_filename(prefix, content_type, date);
            dir.map(|d| d.join(&name)).unwrap_or_else(|| PathBuf::from(name))
        }
    }
}

/// Helper function to create a buffered file writer
///
/// # Arguments
/// * `path` - File path to create
///
/// # Returns
/// * `Result<BufWriter<File>>` - Buffered writer or error
pub async fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    validate_path(path)?;
    let file = File::create(path).await.map_err(|e| {
        ExportError::Generic(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::with_capacity(1024 * 1024, file))
}

/// Helper function to validate file path and directory
///
/// # Arguments
/// * `path` - File path to validate
///
/// # Returns
/// * `Result<()>` - Success or error
pub fn validate_path(path: &Path) -> Result<()> {
    // Check if parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ExportError::Generic(format!(
                "Directory does not exist: {}",
                parent.display()
            )));
        }
    }

    Ok(())
}
