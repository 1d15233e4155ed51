//! HTTP implementation of [`PageFetcher`] on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::error::{FetchError, Result};

use super::{Page, PageFetcher, SiteConnection, TOTAL_PAGES_HEADER, parse_total_pages};

/// A content type advertised by the site's `/types` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentType {
    /// Internal slug (`post`, `page`, ...)
    pub slug: String,
    /// Human readable name
    pub name: String,
    /// Route segment used for collection requests (`posts`, `pages`, ...)
    pub rest_base: String,
}

/// REST client bound to one site
///
/// Every request carries the site's credentials, if any. Non-2xx responses
/// become [`FetchError::Status`]; nothing is retried.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    site: SiteConnection,
}

impl RestClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `site` - Site location and credentials
    /// * `timeout` - Per-request timeout
    ///
    /// # Returns
    /// * `Result<Self>` - Client or an invalid URL error
    pub fn new(site: SiteConnection, timeout: Duration) -> Result<Self> {
        Url::parse(&site.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", site.base_url)))?;

        let http = reqwest::Client::builder()
            .user_agent(format!("wpcsv/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { http, site })
    }

    /// The site this client talks to
    pub fn site(&self) -> &SiteConnection {
        &self.site
    }

    /// Issue a GET and fail on any non-2xx status
    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!("GET {}", url);

        let mut request = self.http.get(url);
        if let Some(ref credentials) = self.site.credentials {
            request = request.header(AUTHORIZATION, credentials.header_value());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                url: url.to_string(),
            }
            .into());
        }

        Ok(response)
    }

    /// List the content types the site exposes, sorted by slug
    pub async fn content_types(&self) -> Result<Vec<ContentType>> {
        let url = self.site.route_url("types");
        let body: Value = self.get(&url).await?.json().await?;

        let Value::Object(entries) = body else {
            return Err(FetchError::Decode(format!("expected an object from {url}")).into());
        };

        let mut types: Vec<ContentType> = entries
            .into_iter()
            .map(|(slug, entry)| {
                let name = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or(slug.as_str())
                    .to_string();
                let rest_base = entry
                    .get("rest_base")
                    .and_then(Value::as_str)
                    .unwrap_or(slug.as_str())
                    .to_string();
                ContentType {
                    slug,
                    name,
                    rest_base,
                }
            })
            .collect();
        types.sort_by(|a, b| a.slug.cmp(&b.slug));

        Ok(types)
    }

    /// Fetch an arbitrary URL as text, sending the site's credentials
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let text = self.get(url).await?.text().await?;
        debug!("Fetched {} bytes from {}", text.len(), url);
        Ok(text)
    }

    /// Verify the site answers a minimal collection request
    pub async fn check_connection(&self) -> Result<()> {
        let url = self.site.page_url("posts", 1, 1);
        self.get(&url).await?;
        info!("Connected to {}", self.site.base_url);
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for RestClient {
    async fn fetch_page(&self, content_type: &str, page: u32, per_page: u32) -> Result<Page> {
        let url = self.site.page_url(content_type, page, per_page);
        let response = self.get(&url).await?;

        let total_pages = parse_total_pages(
            response
                .headers()
                .get(TOTAL_PAGES_HEADER)
                .and_then(|v| v.to_str().ok()),
        );

        let items = match response.json::<Value>().await? {
            Value::Array(items) => items,
            other => {
                return Err(FetchError::Decode(format!(
                    "expected a JSON array from {url}, got {}",
                    json_kind(&other)
                ))
                .into());
            }
        };

        debug!(
            "Fetched page {}/{} of '{}' ({} records)",
            page,
            total_pages,
            content_type,
            items.len()
        );

        Ok(Page { items, total_pages })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Credentials;
    use crate::error::ExportError;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> RestClient {
        RestClient::new(SiteConnection::new(server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_page_reads_items_and_total_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .and(query_param("per_page", "2"))
            .and(query_param("page", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-WP-TotalPages", "3")
                    .set_body_json(json!([{ "id": 1 }, { "id": 2 }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server).fetch_page("posts", 1, 2).await.unwrap();
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![json!({ "id": 1 }), json!({ "id": 2 })]);
    }

    #[tokio::test]
    async fn test_fetch_page_without_header_is_single_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/pages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 9 }])))
            .mount(&server)
            .await;

        let page = client_for(&server).fetch_page("pages", 1, 10).await.unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_page_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let site =
            SiteConnection::new(server.uri()).with_credentials(Credentials::Bearer("s3cret".into()));
        let client = RestClient::new(site, Duration::from_secs(5)).unwrap();
        client.fetch_page("posts", 1, 10).await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_page_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_page("missing", 1, 10)
            .await
            .unwrap_err();
        match err {
            ExportError::Fetch(FetchError::Status {
                status,
                status_text,
                url,
            }) => {
                assert_eq!(status, 404);
                assert_eq!(status_text, "Not Found");
                assert!(url.ends_with("/wp-json/wp/v2/missing?per_page=10&page=1"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_rejects_non_array_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "rest_no_route" })))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_page("posts", 1, 10).await.unwrap_err();
        assert!(matches!(err, ExportError::Fetch(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_content_types_sorted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/types"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "page": { "name": "Pages", "slug": "page", "rest_base": "pages" },
                "post": { "name": "Posts", "slug": "post", "rest_base": "posts" },
                "attachment": { "name": "Media", "rest_base": "media" }
            })))
            .mount(&server)
            .await;

        let types = client_for(&server).content_types().await.unwrap();
        let slugs: Vec<&str> = types.iter().map(|t| t.slug.as_str()).collect();
        assert_eq!(slugs, vec!["attachment", "page", "post"]);
        assert_eq!(types[0].rest_base, "media");
        assert_eq!(types[0].name, "Media");
    }

    #[tokio::test]
    async fn test_check_connection_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/wp-json/wp/v2/posts"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client_for(&server).check_connection().await.unwrap_err();
        assert!(matches!(err, ExportError::Fetch(ref e) if e.status() == Some(401)));
    }

    #[tokio::test]
    async fn test_fetch_text_sends_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exports/posts.csv"))
            .and(header("Authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("id,title\n1,Hello\n"))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/exports/posts.csv", server.uri());
        let site = SiteConnection::new(url.clone()).with_credentials(Credentials::Bearer("s3cret".into()));
        let client = RestClient::new(site, Duration::from_secs(5)).unwrap();

        assert_eq!(client.fetch_text(&url).await.unwrap(), "id,title\n1,Hello\n");
    }

    #[tokio::test]
    async fn test_fetch_text_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let url = format!("{}/private.csv", server.uri());
        let err = client_for(&server).fetch_text(&url).await.unwrap_err();
        assert!(matches!(err, ExportError::Fetch(ref e) if e.status() == Some(403)));
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let err = RestClient::new(SiteConnection::new("not a url"), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, ExportError::Fetch(FetchError::InvalidUrl(_))));
    }
}
