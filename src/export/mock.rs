//! In-memory [`PageFetcher`] for export tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{Page, PageFetcher};
use crate::error::{FetchError, Result};

/// Serves fixed pages, optionally delaying or failing specific ones, and
/// records the order in which pages were requested and completed.
pub(crate) struct MockFetcher {
    pages: Vec<Vec<Value>>,
    delays: HashMap<u32, Duration>,
    failing_page: Option<u32>,
    requested: Mutex<Vec<u32>>,
    completed: Mutex<Vec<u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new(pages: Vec<Vec<Value>>) -> Self {
        Self {
            pages,
            delays: HashMap::new(),
            failing_page: None,
            requested: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_delay(mut self, page: u32, delay: Duration) -> Self {
        self.delays.insert(page, delay);
        self
    }

    pub(crate) fn failing_on(mut self, page: u32) -> Self {
        self.failing_page = Some(page);
        self
    }

    pub(crate) fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }

    pub(crate) fn completed(&self) -> Vec<u32> {
        self.completed.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch_page(&self, _content_type: &str, page: u32, _per_page: u32) -> Result<Page> {
        self.requested.lock().unwrap().push(page);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&page) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.lock().unwrap().push(page);

        if self.failing_page == Some(page) {
            return Err(FetchError::Status {
                status: 500,
                status_text: "Internal Server Error".to_string(),
                url: format!("mock://page/{page}"),
            }
            .into());
        }

        let items = self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();

        Ok(Page {
            items,
            total_pages: self.pages.len().max(1) as u32,
        })
    }
}
