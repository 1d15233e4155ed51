//! Export coordinator for orchestrating export operations
//!
//! This module brings together the page fetcher, the streaming producer and
//! an output sink. It is the consumer side of [`CsvExportStream`]: chunks are
//! either piped into an async writer or accumulated in memory. The eager
//! path (everything fetched up front) lives here too.

use std::time::Instant;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::client::PageFetcher;
use crate::error::{ExportError, Result};
use crate::record::{FlatRecord, flatten};

use super::aggregate::fetch_pages;
use super::csv::encode_document;
use super::request::ExportRequest;
use super::streaming::CsvExportStream;

/// Result of an export operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Number of records exported
    pub records_exported: u64,
    /// Pages requested from the server
    pub pages_fetched: u32,
    /// Bytes of CSV produced
    pub bytes_written: u64,
    /// Time taken for export
    pub elapsed_ms: u64,
}

/// Coordinator for export operations
///
/// Holds no state between runs; every call builds its own stream and
/// counters from the request.
pub struct ExportCoordinator<'a, F: PageFetcher + ?Sized> {
    /// Page source
    fetcher: &'a F,
    /// What to export
    request: ExportRequest,
}

impl<'a, F: PageFetcher + ?Sized> ExportCoordinator<'a, F> {
    /// Create a new export coordinator
    pub fn new(fetcher: &'a F, request: ExportRequest) -> Self {
        Self { fetcher, request }
    }

    /// The request this coordinator runs
    pub fn request(&self) -> &ExportRequest {
        &self.request
    }

    /// Stream the export into `sink`
    ///
    /// Chunks are written as they are produced. On failure or cancellation
    /// the sink is still flushed so the partial output stays in place, and
    /// the error is returned to the caller.
    ///
    /// # Returns
    /// * `Result<ExportResult>` - Export statistics or error
    pub async fn write_to<W>(&self, sink: &mut W) -> Result<ExportResult>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let start_time = Instant::now();
        info!(
            "Starting streaming export of '{}' ({} fields, {} per page)",
            self.request.content_type,
            self.request.fields.len(),
            self.request.per_page
        );

        let mut stream = CsvExportStream::new(self.fetcher, self.request.clone());
        let mut bytes_written = 0u64;

        let outcome: Result<()> = loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(e) = sink.write_all(chunk.as_bytes()).await {
                        break Err(e.into());
                    }
                    bytes_written += chunk.len() as u64;
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        // Keep whatever was written so far, even on failure
        let flushed = sink.flush().await;

        if let Err(e) = outcome {
            if !e.is_cancelled() {
                warn!(
                    "Export of '{}' failed after {} records: {}",
                    self.request.content_type,
                    stream.records_processed(),
                    e
                );
            }
            return Err(e);
        }
        flushed?;

        let result = ExportResult {
            records_exported: stream.records_processed(),
            pages_fetched: stream.pages_fetched(),
            bytes_written,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Export completed: {} records, {} bytes, {} ms",
            result.records_exported, result.bytes_written, result.elapsed_ms
        );
        Ok(result)
    }

    /// Stream the export into an in-memory string
    pub async fn collect_string(&self) -> Result<(String, ExportResult)> {
        let mut buffer: Vec<u8> = Vec::new();
        let result = self.write_to(&mut buffer).await?;
        let text = String::from_utf8(buffer)
            .map_err(|e| ExportError::Generic(format!("Export produced invalid UTF-8: {e}")))?;
        Ok((text, result))
    }

    /// Fetch every page up front, then encode the whole document
    ///
    /// Rows are joined with `\n` and the document has no trailing newline.
    pub async fn export_eager(&self) -> Result<String> {
        self.export_eager_with_result().await.map(|(csv, _)| csv)
    }

    /// Eager export that also reports statistics
    pub async fn export_eager_with_result(&self) -> Result<(String, ExportResult)> {
        let start_time = Instant::now();
        info!(
            "Starting eager export of '{}' (concurrency {})",
            self.request.content_type, self.request.concurrency
        );

        let (items, pages_fetched) = fetch_pages(
            self.fetcher,
            &self.request.content_type,
            self.request.per_page,
            self.request.concurrency,
            self.request.cancel.as_ref(),
        )
        .await?;

        if items.is_empty() {
            return Err(ExportError::EmptyCollection {
                content_type: self.request.content_type.clone(),
            });
        }

        let records: Vec<FlatRecord> = items.iter().map(flatten).collect();
        debug!("Flattened {} records", records.len());

        let csv = encode_document(&self.request.fields, &records);
        let result = ExportResult {
            records_exported: records.len() as u64,
            pages_fetched,
            bytes_written: csv.len() as u64,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Export completed: {} records, {} bytes, {} ms",
            result.records_exported, result.bytes_written, result.elapsed_ms
        );
        Ok((csv, result))
    }
}
