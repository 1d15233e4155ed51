//! Remote content API access
//!
//! This module is the only network boundary of the crate:
//! - [`PageFetcher`]: the seam the export pipeline depends on
//! - [`RestClient`]: the HTTP implementation for `wp-json/wp/v2` style APIs
//! - [`SiteConnection`] / [`Credentials`]: where and how to connect

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::Result;

pub mod rest;

pub use rest::{ContentType, RestClient};

/// Default REST route prefix appended to the site URL.
pub const DEFAULT_REST_PREFIX: &str = "wp-json/wp/v2";

/// Response header carrying the total number of pages.
pub const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// One page of a remote collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Records on this page, in server order
    pub items: Vec<Value>,
    /// Total number of pages in the collection (always >= 1)
    pub total_pages: u32,
}

/// Trait for fetching one page of a content type
///
/// Implementations perform exactly one request per call, never retry and
/// never cache.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch page `page` (1-based) of `content_type` with `per_page` records
    ///
    /// # Returns
    /// * `Result<Page>` - The page's records and the collection's page count
    async fn fetch_page(&self, content_type: &str, page: u32, per_page: u32) -> Result<Page>;
}

/// Authentication sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: Basic base64(username:password)`
    Basic { username: String, password: String },
}

impl Credentials {
    /// Render the `Authorization` header value.
    pub fn header_value(&self) -> String {
        match self {
            Credentials::Bearer(token) => format!("Bearer {token}"),
            Credentials::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }
}

// Keep secrets out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Bearer(_) => write!(f, "Bearer(***)"),
            Credentials::Basic { username, .. } => write!(f, "Basic({username}:***)"),
        }
    }
}

/// Where the content lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct SiteConnection {
    /// Site base URL, e.g. `https://example.com`
    pub base_url: String,
    /// Route prefix between the base URL and the content type
    pub rest_prefix: String,
    /// Optional credentials
    pub credentials: Option<Credentials>,
}

impl SiteConnection {
    /// Connection with the default REST prefix and no credentials
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            rest_prefix: DEFAULT_REST_PREFIX.to_string(),
            credentials: None,
        }
    }

    /// Attach credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override the REST route prefix
    pub fn with_rest_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rest_prefix = prefix.into();
        self
    }

    /// `{base}/{prefix}/{route}` with redundant slashes removed
    pub fn route_url(&self, route: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.rest_prefix.trim_matches('/'),
            route.trim_start_matches('/')
        )
    }

    /// URL of one page of a content type
    pub fn page_url(&self, content_type: &str, page: u32, per_page: u32) -> String {
        format!(
            "{}?per_page={}&page={}",
            self.route_url(content_type),
            per_page,
            page
        )
    }
}

/// Parse a total-pages header value; absent or invalid means a single page.
pub fn parse_total_pages(value: Option<&str>) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}
