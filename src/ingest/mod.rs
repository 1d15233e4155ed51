//! CSV ingestion for user-supplied files
//!
//! Parses CSV text (typically an earlier export) into a header row and data
//! rows so it can be previewed, narrowed to selected columns and written back
//! out. Text comes from a local file or an `http(s)://` URL. Blank lines are
//! skipped; any structural problem is reported as a [`ParseError`] pointing
//! at the first bad line.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::client::RestClient;
use crate::error::{ConfigError, ExportError, ParseError, Result};
use crate::export::csv::encode_document;
use crate::record::FlatRecord;

/// Where CSV text is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvSource {
    /// Local file
    File(PathBuf),
    /// `http://` or `https://` URL
    Remote(String),
}

impl CsvSource {
    /// Classify a command-line argument
    pub fn parse(source: &str) -> Self {
        let lower = source.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            CsvSource::Remote(source.to_string())
        } else {
            CsvSource::File(PathBuf::from(source))
        }
    }

    /// Read the raw CSV text
    ///
    /// Remote sources need an HTTP client; its credentials are sent along.
    pub async fn load_text(&self, http: Option<&RestClient>) -> Result<String> {
        match self {
            CsvSource::File(path) => read_text(path).await,
            CsvSource::Remote(url) => match http {
                Some(client) => client.fetch_text(url).await,
                None => Err(ConfigError::Generic(format!("No HTTP client to fetch {url}")).into()),
            },
        }
    }
}

impl fmt::Display for CsvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsvSource::File(path) => write!(f, "{}", path.display()),
            CsvSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Shape and size of loaded CSV text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvSummary {
    pub rows: usize,
    pub columns: usize,
    pub size_bytes: usize,
}

impl CsvSummary {
    /// Size in KB, rounded to the nearest whole KB
    pub fn size_kb(&self) -> usize {
        (self.size_bytes + 512) / 1024
    }
}

impl fmt::Display for CsvSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rows: {}  Columns: {}  Size: {} KB",
            self.rows,
            self.columns,
            self.size_kb()
        )
    }
}

/// Parsed CSV content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    /// Column names from the first line
    pub headers: Vec<String>,
    /// Data rows; every row has `headers.len()` cells
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Cell value by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    /// Row and column counts, with the size of the text it was parsed from
    pub fn summary(&self, size_bytes: usize) -> CsvSummary {
        CsvSummary {
            rows: self.rows.len(),
            columns: self.headers.len(),
            size_bytes,
        }
    }

    /// Keep only `columns`, in the given order
    ///
    /// # Returns
    /// * `Result<CsvTable>` - Narrowed table, or an error naming the first unknown column
    pub fn select_columns(&self, columns: &[String]) -> Result<CsvTable> {
        let indices = columns
            .iter()
            .map(|column| {
                self.headers.iter().position(|h| h == column).ok_or_else(|| {
                    ExportError::Config(ConfigError::InvalidValue {
                        field: "columns".to_string(),
                        value: format!("{} (available: {})", column, self.headers.join(", ")),
                    })
                })
            })
            .collect::<Result<Vec<usize>>>()?;

        Ok(CsvTable {
            headers: columns.to_vec(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        })
    }

    /// Re-encode as CSV text (no trailing newline)
    pub fn to_csv(&self) -> String {
        encode_document(&self.headers, &self.records())
    }

    /// Rows as column-name keyed records
    pub fn records(&self) -> Vec<FlatRecord> {
        self.rows
            .iter()
            .map(|row| self.headers.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }
}

/// Parse CSV text with a mandatory header row
///
/// # Returns
/// * `Result<CsvTable>` - Parsed table or the first structural problem
pub fn parse_csv(text: &str) -> Result<CsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(ParseError {
            line: None,
            message: "missing header row".to_string(),
        }
        .into());
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(parse_error)?;

        // Blank line
        if record.len() == 1 && record[0].is_empty() && headers.len() > 1 {
            continue;
        }

        if record.len() != headers.len() {
            return Err(ParseError {
                line: record.position().map(|p| p.line()),
                message: format!(
                    "expected {} fields, found {}",
                    headers.len(),
                    record.len()
                ),
            }
            .into());
        }

        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(CsvTable { headers, rows })
}

/// Read and parse a CSV file
pub async fn read_csv_file(path: &Path) -> Result<CsvTable> {
    parse_csv(&read_text(path).await?)
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ExportError::Generic(format!("Failed to read {}: {}", path.display(), e)))
}

fn parse_error(err: csv::Error) -> ExportError {
    let line = err.position().map(|p| p.line());
    let message = match err.kind() {
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8: {err}"),
        _ => err.to_string(),
    };
    ParseError { line, message }.into()
}
