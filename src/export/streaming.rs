//! Streaming CSV export
//!
//! [`CsvExportStream`] is a pull-based producer of CSV text chunks. Pages are
//! fetched strictly one at a time in ascending order, so at most one page of
//! records is held in memory. The stream suspends only while a page is being
//! fetched; flattening and encoding happen between pulls.
//!
//! ```text
//! Idle -> HeaderEmitted -> FetchingPage(n) -> EmittingRows(n) -> ... -> Done
//!                               |                  |
//!                               +---> Cancelled <--+
//! ```

use futures::Stream;
use tracing::{debug, info};

use crate::client::{Page, PageFetcher};
use crate::error::{ExportError, Result};
use crate::record::flatten;

use super::csv::{LINE_TERMINATOR, encode_header, encode_row};
use super::request::{ExportProgress, ExportRequest};

/// Position in the export state machine
#[derive(Debug)]
enum StreamState {
    /// Nothing emitted yet
    Idle,
    /// Header chunk emitted, no page requested
    HeaderEmitted,
    /// Next pull fetches this page
    FetchingPage(u32),
    /// Rows of this page still to be emitted
    EmittingRows {
        page: u32,
        rows: std::vec::IntoIter<serde_json::Value>,
    },
    /// Every page emitted
    Done,
    /// Cancellation observed
    Cancelled,
    /// A fetch or validation error was returned
    Failed,
}

/// Lazy, finite, non-restartable sequence of CSV chunks
///
/// The first chunk is the header line; every following chunk is one record
/// terminated by `\n`. Once an error has been returned (including
/// [`ExportError::Cancelled`]) the stream yields nothing more.
pub struct CsvExportStream<'a, F: PageFetcher + ?Sized> {
    fetcher: &'a F,
    request: ExportRequest,
    state: StreamState,
    total_pages: u32,
    pages_fetched: u32,
    records_processed: u64,
}

impl<'a, F: PageFetcher + ?Sized> CsvExportStream<'a, F> {
    /// Create a new stream; nothing is fetched until the first pull
    pub fn new(fetcher: &'a F, request: ExportRequest) -> Self {
        Self {
            fetcher,
            request,
            state: StreamState::Idle,
            total_pages: 0,
            pages_fetched: 0,
            records_processed: 0,
        }
    }

    /// Rows emitted so far
    pub fn records_processed(&self) -> u64 {
        self.records_processed
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Total pages, known once page 1 has arrived (0 before)
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// True once the stream completed successfully
    pub fn is_done(&self) -> bool {
        matches!(self.state, StreamState::Done)
    }

    /// Pull the next chunk
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Next chunk, `None` when exhausted
    pub async fn next_chunk(&mut self) -> Result<Option<String>> {
        loop {
            // Anything that returns early through `?` leaves the stream Failed
            match std::mem::replace(&mut self.state, StreamState::Failed) {
                StreamState::Idle => {
                    let mut header = encode_header(&self.request.fields);
                    header.push(LINE_TERMINATOR);
                    self.state = StreamState::HeaderEmitted;
                    return Ok(Some(header));
                }
                StreamState::HeaderEmitted => {
                    self.state = StreamState::FetchingPage(1);
                }
                StreamState::FetchingPage(page) => {
                    self.check_cancelled()?;

                    let fetched = match self.fetch(page).await {
                        Ok(fetched) => fetched,
                        Err(e) if e.is_cancelled() => return Err(self.cancelled()),
                        Err(e) => return Err(e),
                    };
                    self.pages_fetched += 1;

                    if page == 1 {
                        self.total_pages = fetched.total_pages;
                        if fetched.items.is_empty() {
                            return Err(ExportError::EmptyCollection {
                                content_type: self.request.content_type.clone(),
                            });
                        }
                    }

                    debug!(
                        "Streaming page {}/{} ({} records)",
                        page,
                        self.total_pages,
                        fetched.items.len()
                    );
                    self.state = StreamState::EmittingRows {
                        page,
                        rows: fetched.items.into_iter(),
                    };
                }
                StreamState::EmittingRows { page, mut rows } => match rows.next() {
                    Some(item) => {
                        self.check_cancelled()?;

                        let mut line = encode_row(&flatten(&item), &self.request.fields);
                        line.push(LINE_TERMINATOR);
                        self.records_processed += 1;
                        self.state = StreamState::EmittingRows { page, rows };
                        return Ok(Some(line));
                    }
                    None => {
                        self.report_progress(page);
                        self.state = if page < self.total_pages {
                            StreamState::FetchingPage(page + 1)
                        } else {
                            info!(
                                "Streamed {} records from {} pages of '{}'",
                                self.records_processed, self.pages_fetched, self.request.content_type
                            );
                            StreamState::Done
                        };
                    }
                },
                terminal @ (StreamState::Done | StreamState::Cancelled | StreamState::Failed) => {
                    self.state = terminal;
                    return Ok(None);
                }
            }
        }
    }

    /// Adapt into a `futures::Stream` of chunks
    pub fn into_stream(self) -> impl Stream<Item = Result<String>> + 'a
    where
        F: 'a,
    {
        futures::stream::try_unfold(self, |mut export| async move {
            Ok(export.next_chunk().await?.map(|chunk| (chunk, export)))
        })
    }

    /// Fetch one page, abandoning the request if cancellation fires first
    async fn fetch(&self, page: u32) -> Result<Page> {
        let request = self
            .fetcher
            .fetch_page(&self.request.content_type, page, self.request.per_page);

        match self.request.cancel {
            Some(ref token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ExportError::Cancelled),
                    result = request => result,
                }
            }
            None => request.await,
        }
    }

    fn check_cancelled(&mut self) -> Result<()> {
        if self.request.is_cancelled() {
            return Err(self.cancelled());
        }
        Ok(())
    }

    fn cancelled(&mut self) -> ExportError {
        info!(
            "Export of '{}' cancelled after {} records",
            self.request.content_type, self.records_processed
        );
        self.state = StreamState::Cancelled;
        ExportError::Cancelled
    }

    fn report_progress(&self, page: u32) {
        self.request.notify(ExportProgress {
            current_page: page,
            total_pages: self.total_pages,
            records_processed: self.records_processed,
            estimated_total: u64::from(self.total_pages) * u64::from(self.request.per_page),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::export::mock::MockFetcher;
    use futures::StreamExt;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn three_pages() -> Vec<Vec<Value>> {
        vec![
            vec![
                json!({ "id": 1, "title": { "rendered": "First" } }),
                json!({ "id": 2, "title": { "rendered": "Second, with comma" } }),
            ],
            vec![json!({ "id": 3, "title": { "rendered": "Third" } })],
            vec![json!({ "id": 4, "title": null, "_links": { "self": [] } })],
        ]
    }

    fn request(fields: &[&str]) -> ExportRequest {
        ExportRequest::new("posts", fields.iter().map(|f| f.to_string()).collect())
            .with_per_page(2)
    }

    async fn drain<F: PageFetcher + ?Sized>(
        stream: &mut CsvExportStream<'_, F>,
    ) -> (Vec<String>, Option<ExportError>) {
        let mut chunks = Vec::new();
        loop {
            match stream.next_chunk().await {
                Ok(Some(chunk)) => chunks.push(chunk),
                Ok(None) => return (chunks, None),
                Err(e) => return (chunks, Some(e)),
            }
        }
    }

    #[tokio::test]
    async fn test_streams_header_then_rows_in_page_order() {
        let fetcher = MockFetcher::new(three_pages());
        let mut stream = CsvExportStream::new(&fetcher, request(&["id", "title.rendered"]));

        let (chunks, err) = drain(&mut stream).await;

        assert!(err.is_none());
        assert_eq!(
            chunks,
            vec![
                "id,title.rendered\n",
                "1,First\n",
                "2,\"Second, with comma\"\n",
                "3,Third\n",
                "4,\n",
            ]
        );
        assert_eq!(fetcher.requested(), vec![1, 2, 3]);
        assert_eq!(stream.records_processed(), 4);
        assert!(stream.is_done());
        // fused after completion
        assert!(stream.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_progress_after_each_page() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let fetcher = MockFetcher::new(three_pages());
        let request =
            request(&["id"]).with_progress(Arc::new(move |p| sink.lock().unwrap().push(p)));

        let (_, err) = drain(&mut CsvExportStream::new(&fetcher, request)).await;
        assert!(err.is_none());

        let seen = seen.lock().unwrap();
        let pages: Vec<(u32, u64)> = seen
            .iter()
            .map(|p| (p.current_page, p.records_processed))
            .collect();
        assert_eq!(pages, vec![(1, 2), (2, 3), (3, 4)]);
        assert!(seen.iter().all(|p| p.total_pages == 3 && p.estimated_total == 6));
    }

    #[tokio::test]
    async fn test_cancel_after_first_page() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        let fetcher = MockFetcher::new(three_pages());
        let request = request(&["id"])
            .with_cancellation(token)
            .with_progress(Arc::new(move |p| {
                if p.current_page == 1 {
                    trigger.cancel();
                }
            }));

        let mut stream = CsvExportStream::new(&fetcher, request);
        let (chunks, err) = drain(&mut stream).await;

        assert_eq!(chunks, vec!["id\n", "1\n", "2\n"]);
        assert!(err.expect("stream should fail").is_cancelled());
        assert_eq!(fetcher.requested(), vec![1]);
        assert!(stream.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cancel_mid_page_stops_rows() {
        let token = CancellationToken::new();
        let fetcher = MockFetcher::new(three_pages());
        let mut stream =
            CsvExportStream::new(&fetcher, request(&["id"]).with_cancellation(token.clone()));

        assert_eq!(stream.next_chunk().await.unwrap().unwrap(), "id\n");
        assert_eq!(stream.next_chunk().await.unwrap().unwrap(), "1\n");
        token.cancel();

        assert!(stream.next_chunk().await.unwrap_err().is_cancelled());
        assert_eq!(stream.records_processed(), 1);
    }

    #[tokio::test]
    async fn test_cancel_abandons_in_flight_fetch() {
        let token = CancellationToken::new();
        let fetcher = MockFetcher::new(three_pages()).with_delay(2, Duration::from_secs(30));
        let mut stream =
            CsvExportStream::new(&fetcher, request(&["id"]).with_cancellation(token.clone()));

        for _ in 0..3 {
            stream.next_chunk().await.unwrap();
        }

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(5), stream.next_chunk())
            .await
            .expect("cancellation should interrupt the fetch")
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(fetcher.completed(), vec![1]);
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let fetcher = MockFetcher::new(vec![vec![]]);
        let mut stream = CsvExportStream::new(&fetcher, request(&["id"]));

        let (chunks, err) = drain(&mut stream).await;

        assert_eq!(chunks, vec!["id\n"]);
        assert!(matches!(
            err,
            Some(ExportError::EmptyCollection { ref content_type }) if content_type == "posts"
        ));
    }

    #[tokio::test]
    async fn test_fetch_error_after_partial_output() {
        let fetcher = MockFetcher::new(three_pages()).failing_on(2);
        let mut stream = CsvExportStream::new(&fetcher, request(&["id"]));

        let (chunks, err) = drain(&mut stream).await;

        assert_eq!(chunks, vec!["id\n", "1\n", "2\n"]);
        assert!(matches!(err, Some(ExportError::Fetch(FetchError::Status { .. }))));
        assert!(stream.next_chunk().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_page_collection() {
        let fetcher = MockFetcher::new(vec![vec![json!({ "id": 9 })]]);
        let (chunks, err) = drain(&mut CsvExportStream::new(&fetcher, request(&["id"]))).await;

        assert!(err.is_none());
        assert_eq!(chunks, vec!["id\n", "9\n"]);
        assert_eq!(fetcher.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_into_stream_concatenates() {
        let fetcher = MockFetcher::new(three_pages());
        let chunks: Vec<Result<String>> =
            CsvExportStream::new(&fetcher, request(&["id"])).into_stream().collect().await;

        let text: String = chunks.into_iter().map(|c| c.unwrap()).collect();
        assert_eq!(text, "id\n1\n2\n3\n4\n");
    }

    #[tokio::test]
    async fn test_into_stream_ends_after_error() {
        let fetcher = MockFetcher::new(three_pages()).failing_on(1);
        let items: Vec<Result<String>> =
            CsvExportStream::new(&fetcher, request(&["id"])).into_stream().collect().await;

        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }
}
