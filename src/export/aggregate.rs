//! Eager collection aggregation
//!
//! Fetches every page of a content type into memory with bounded
//! concurrency. Pages are fetched in consecutive batches; a batch must
//! finish before the next one starts, and results are reassembled by page
//! number regardless of which request finished first.

use futures::future::try_join_all;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::PageFetcher;
use crate::error::{ExportError, Result};

/// Fetch all records of `content_type`
///
/// # Arguments
/// * `fetcher` - Page source
/// * `content_type` - Collection to fetch
/// * `per_page` - Records per request
/// * `concurrency` - Maximum requests in flight (values below 1 mean 1)
/// * `cancel` - Checked before every batch; also abandons a batch in flight
///
/// # Returns
/// * `Result<Vec<Value>>` - Records in page order, or the first page error
pub async fn fetch_all<F>(
    fetcher: &F,
    content_type: &str,
    per_page: u32,
    concurrency: usize,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Value>>
where
    F: PageFetcher + ?Sized,
{
    fetch_pages(fetcher, content_type, per_page, concurrency, cancel)
        .await
        .map(|(records, _)| records)
}

/// Same as [`fetch_all`], also returning the number of pages fetched
pub async fn fetch_pages<F>(
    fetcher: &F,
    content_type: &str,
    per_page: u32,
    concurrency: usize,
    cancel: Option<&CancellationToken>,
) -> Result<(Vec<Value>, u32)>
where
    F: PageFetcher + ?Sized,
{
    let is_cancelled = || cancel.is_some_and(|t| t.is_cancelled());

    if is_cancelled() {
        return Err(ExportError::Cancelled);
    }

    // Page 1 alone: it tells us how many pages exist
    let first = until_cancelled(cancel, fetcher.fetch_page(content_type, 1, per_page)).await?;
    let total_pages = first.total_pages;
    let mut result = first.items;

    if total_pages <= 1 {
        return Ok((result, 1));
    }

    let remaining: Vec<u32> = (2..=total_pages).collect();
    for batch in remaining.chunks(concurrency.max(1)) {
        if is_cancelled() {
            return Err(ExportError::Cancelled);
        }

        debug!(
            "Fetching pages {:?} of {} for '{}'",
            batch, total_pages, content_type
        );

        // try_join_all keeps input order, not completion order
        let pages = until_cancelled(
            cancel,
            try_join_all(
                batch
                    .iter()
                    .map(|&page| fetcher.fetch_page(content_type, page, per_page)),
            ),
        )
        .await?;

        for page in pages {
            result.extend(page.items);
        }
    }

    debug!(
        "Aggregated {} records from {} pages of '{}'",
        result.len(),
        total_pages,
        content_type
    );

    Ok((result, total_pages))
}

/// Resolve `work`, or fail with `Cancelled` as soon as the token fires
async fn until_cancelled<T>(
    cancel: Option<&CancellationToken>,
    work: impl Future<Output = Result<T>>,
) -> Result<T> {
    match cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(ExportError::Cancelled),
                result = work => result,
            }
        }
        None => work.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::export::mock::MockFetcher;
    use serde_json::json;
    use std::time::Duration;

    fn ids(values: &[Value]) -> Vec<i64> {
        values.iter().map(|v| v["id"].as_i64().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_single_page_returns_first_page() {
        let fetcher = MockFetcher::new(vec![vec![json!({ "id": 1 }), json!({ "id": 2 })]]);
        let all = fetch_all(&fetcher, "posts", 10, 5, None).await.unwrap();
        assert_eq!(ids(&all), vec![1, 2]);
        assert_eq!(fetcher.requested(), vec![1]);
    }

    #[tokio::test]
    async fn test_order_preserved_when_later_page_finishes_first() {
        let fetcher = MockFetcher::new(vec![
            vec![json!({ "id": 1 }), json!({ "id": 2 })],
            vec![json!({ "id": 3 }), json!({ "id": 4 })],
            vec![json!({ "id": 5 })],
        ])
        .with_delay(2, Duration::from_millis(60));

        let all = fetch_all(&fetcher, "posts", 2, 2, None).await.unwrap();

        assert_eq!(all.len(), 5);
        assert_eq!(ids(&all), vec![1, 2, 3, 4, 5]);
        // page 3 really did resolve before page 2
        assert_eq!(fetcher.completed(), vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_by_batches() {
        let pages: Vec<Vec<Value>> = (1..=7).map(|i| vec![json!({ "id": i })]).collect();
        let mut fetcher = MockFetcher::new(pages);
        for page in 2..=7 {
            fetcher = fetcher.with_delay(page, Duration::from_millis(10));
        }

        let all = fetch_all(&fetcher, "posts", 1, 2, None).await.unwrap();

        assert_eq!(ids(&all), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(fetcher.max_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_page_failure_aborts_aggregation() {
        let fetcher = MockFetcher::new(vec![
            vec![json!({ "id": 1 })],
            vec![json!({ "id": 2 })],
            vec![json!({ "id": 3 })],
        ])
        .failing_on(3);

        let err = fetch_all(&fetcher, "posts", 1, 5, None).await.unwrap_err();
        assert!(matches!(
            err,
            ExportError::Fetch(FetchError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let fetcher = MockFetcher::new(vec![vec![json!({ "id": 1 })]]);
        let token = CancellationToken::new();
        token.cancel();

        let err = fetch_all(&fetcher, "posts", 1, 5, Some(&token))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(fetcher.requested().is_empty());
    }

    #[tokio::test]
    async fn test_page_count_with_short_pages() {
        let pages: Vec<Vec<Value>> = (1..=3).map(|i| vec![json!({ "id": i })]).collect();
        let fetcher = MockFetcher::new(pages);

        let (all, pages_fetched) = fetch_pages(&fetcher, "posts", 2, 2, None).await.unwrap();

        assert_eq!(ids(&all), vec![1, 2, 3]);
        assert_eq!(pages_fetched, 3);
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_abandons_batch_in_flight() {
        let fetcher = MockFetcher::new(vec![
            vec![json!({ "id": 1 })],
            vec![json!({ "id": 2 })],
            vec![json!({ "id": 3 })],
        ])
        .with_delay(2, Duration::from_secs(30))
        .with_delay(3, Duration::from_secs(30));
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                token.cancel();
            })
        };

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            fetch_all(&fetcher, "posts", 1, 2, Some(&token)),
        )
        .await
        .expect("cancellation should interrupt the batch")
        .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(fetcher.requested(), vec![1, 2, 3]);
        assert_eq!(fetcher.completed(), vec![1]);
        canceller.await.unwrap();
    }
}
