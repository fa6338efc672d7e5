use futures::StreamExt;
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::snapshot::SnapshotSource;
use super::wire::PagePayload;
use crate::model::{Article, CollectionPage};
use crate::util::validate_base_url;

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Error Types
// ============================================================================

/// Errors returned by the remote client.
///
/// `Network`, `HttpStatus`, `Timeout` and `ResponseTooLarge` are transport
/// failures; list fetches recover from them once via the snapshot resource.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Single-item fetch answered 404
    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },
    /// Body was not the expected JSON shape
    #[error("Malformed response from {origin}: {message}")]
    Parse { origin: String, message: String },
    /// Local snapshot file could not be read
    #[error("Failed to read snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Base URL or path could not be turned into a request URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Mutation payload rejected before sending
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Background fetch task panicked before reporting a result
    #[error("Fetch task panicked: {0}")]
    TaskPanicked(String),
}

impl FetchError {
    /// True for network, status, timeout and size failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_)
                | FetchError::HttpStatus(_)
                | FetchError::Timeout(_)
                | FetchError::ResponseTooLarge(_)
        )
    }

    pub(crate) fn parse(origin: impl Into<String>, err: serde_json::Error) -> Self {
        FetchError::Parse {
            origin: origin.into(),
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Fetch Results
// ============================================================================

/// Answer to a paged request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    /// Live server page; `total` is the server's count.
    Page(CollectionPage<T>),
    /// Full collection from the snapshot resource. Ignores the requested
    /// page and limit, so the caller must paginate it.
    Snapshot(Vec<T>),
}

/// Location of one list resource on the API and in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Endpoint {
    pub path: &'static str,
    pub snapshot_file: &'static str,
}

impl Endpoint {
    pub const ARTICLES: Endpoint = Endpoint {
        path: "articles",
        snapshot_file: "articles.json",
    };
    pub const CATEGORIES: Endpoint = Endpoint {
        path: "categories",
        snapshot_file: "categories.json",
    };
}

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Create a redirect policy with loop detection and limited hops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

// ============================================================================
// Remote Client
// ============================================================================

/// Client for the publishing API with a static snapshot fallback.
///
/// Cloning is cheap; the underlying `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    api_base: Url,
    snapshot: SnapshotSource,
    timeout: Duration,
    token: Option<SecretString>,
}

impl std::fmt::Debug for RemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteClient")
            .field("api_base", &self.api_base.as_str())
            .field("snapshot", &self.snapshot)
            .field("timeout", &self.timeout)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RemoteClient {
    /// Build a client for `api_base` (e.g. `https://news.example.com/api`).
    pub fn new(api_base: &str, snapshot: SnapshotSource) -> Result<Self, FetchError> {
        let api_base =
            validate_base_url(api_base).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .build()?;

        Ok(Self {
            http,
            api_base,
            snapshot,
            timeout: DEFAULT_TIMEOUT,
            token: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Copy of this client that sends `token` as a bearer credential.
    pub fn with_token(&self, token: SecretString) -> Self {
        let mut client = self.clone();
        client.token = Some(token);
        client
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// URL for `segments` below the API base. Segments are percent-encoded.
    pub(crate) fn url_for(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ========================================================================
    // List Fetches
    // ========================================================================

    /// Fetch a whole collection, falling back to the snapshot on failure.
    pub(crate) async fn collection<P: PagePayload>(
        &self,
        endpoint: Endpoint,
    ) -> Result<Vec<P::Item>, FetchError> {
        let url = self.url_for(&[endpoint.path])?;
        match self.get_json::<P>(url).await {
            Ok(payload) => Ok(payload.into_items()),
            Err(live) => self.fallback::<P::Item>(endpoint, &live).await,
        }
    }

    /// Fetch one server page, falling back to the full snapshot on failure.
    pub(crate) async fn page<P: PagePayload>(
        &self,
        endpoint: Endpoint,
        page: usize,
        limit: usize,
    ) -> Result<Fetched<P::Item>, FetchError> {
        let mut url = self.url_for(&[endpoint.path])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());

        match self.get_json::<P>(url).await {
            Ok(payload) => Ok(Fetched::Page(payload.into_page(page, limit))),
            Err(live) => self
                .fallback::<P::Item>(endpoint, &live)
                .await
                .map(Fetched::Snapshot),
        }
    }

    /// Load the snapshot for `endpoint` after the live call failed.
    ///
    /// Called once per failed live request; a snapshot failure is returned
    /// as-is.
    async fn fallback<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        live_error: &FetchError,
    ) -> Result<Vec<T>, FetchError> {
        tracing::warn!(
            resource = endpoint.path,
            fallback = %self.snapshot.describe(endpoint.snapshot_file),
            error = %live_error,
            "API request failed, using snapshot fallback"
        );

        let items = self
            .snapshot
            .load::<T>(self, endpoint.snapshot_file)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    resource = endpoint.path,
                    error = %e,
                    "Snapshot fallback failed"
                );
            })?;

        tracing::debug!(
            resource = endpoint.path,
            count = items.len(),
            "Loaded snapshot collection"
        );
        Ok(items)
    }

    // ========================================================================
    // Single Items
    // ========================================================================

    /// Fetch one article by ID. A 404 becomes [`FetchError::NotFound`].
    ///
    /// No snapshot fallback: a stale copy of one article is worse than an
    /// explicit error on the detail page.
    pub async fn fetch_article(&self, id: &str) -> Result<Article, FetchError> {
        let url = self.url_for(&[Endpoint::ARTICLES.path, id])?;
        match self.get_json::<Article>(url).await {
            Err(FetchError::HttpStatus(404)) => Err(FetchError::NotFound {
                resource: "article",
                id: id.to_string(),
            }),
            other => other,
        }
    }

    // ========================================================================
    // Request Plumbing
    // ========================================================================

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        let origin = url.to_string();
        let bytes = self.send(Method::GET, url, None::<&()>).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::parse(origin, e))
    }

    /// Send a request and return the body of a 2xx response.
    pub(crate) async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Vec<u8>, FetchError> {
        let mut request = self.http.request(method.clone(), url.clone());

        if let Some(body) = body {
            let json = serde_json::to_vec(body).map_err(|e| FetchError::parse(url.as_str(), e))?;
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(json);
        }

        if let Some(token) = &self.token {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            );
        }

        tracing::trace!(method = %method, url = %url, "Sending request");

        // One deadline covers connect, headers and body
        let deadline = tokio::time::Instant::now() + self.timeout;
        let response = tokio::time::timeout_at(deadline, request.send())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
            .map_err(FetchError::Network)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(method = %method, url = %url, status = status.as_u16(), "Non-success response");
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Vec::new());
        }

        tokio::time::timeout_at(deadline, read_limited_bytes(response, MAX_RESPONSE_SIZE))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::wire::ArticlesPayload;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn article_json(id: &str, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "content": "body",
            "userId": "u1",
            "categoryId": "c1",
            "category": {"id": "c1", "name": "tech"}
        })
    }

    async fn client_for(server: &MockServer) -> RemoteClient {
        let api = format!("{}/api", server.uri());
        let snapshot = SnapshotSource::Http(Url::parse(&format!("{}/data", server.uri())).unwrap());
        RemoteClient::new(&api, snapshot).unwrap()
    }

    #[tokio::test]
    async fn test_page_uses_live_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .and(query_param("page", "2"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [article_json("b", "Second")],
                "total": 2,
                "page": 2,
                "limit": 1
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let fetched = client
            .page::<ArticlesPayload>(Endpoint::ARTICLES, 2, 1)
            .await
            .unwrap();

        match fetched {
            Fetched::Page(page) => {
                assert_eq!(page.total, 2);
                assert_eq!(page.items.len(), 1);
                assert_eq!(page.items[0].id, "b");
            }
            Fetched::Snapshot(_) => panic!("expected live page"),
        }
    }

    #[tokio::test]
    async fn test_page_falls_back_to_snapshot_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/articles.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                article_json("a", "First"),
                article_json("b", "Second"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let fetched = client
            .page::<ArticlesPayload>(Endpoint::ARTICLES, 1, 10)
            .await
            .unwrap();

        assert!(matches!(fetched, Fetched::Snapshot(ref items) if items.len() == 2));
    }

    #[tokio::test]
    async fn test_malformed_live_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/articles.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": [article_json("a", "First")]})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let items = client
            .collection::<ArticlesPayload>(Endpoint::ARTICLES)
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_both_failing_returns_snapshot_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/articles.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.collection::<ArticlesPayload>(Endpoint::ARTICLES).await;

        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_fetch_article_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let result = client.fetch_article("missing").await;

        match result {
            Err(FetchError::NotFound { resource, id }) => {
                assert_eq!(resource, "article");
                assert_eq!(id, "missing");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_article_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles/a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(article_json("a1", "Hello")))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let article = client.fetch_article("a1").await.unwrap();
        assert_eq!(article.title, "Hello");
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = client_for(&server)
            .await
            .with_timeout(Duration::from_millis(100));
        let result = client.fetch_article("slow").await;

        let err = result.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_timeout_spans_headers_and_body() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Headers and body each arrive within the timeout, but not both
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let body = article_json("a1", "Hello").to_string();
            tokio::time::sleep(Duration::from_millis(250)).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(250)).await;
            let _ = socket.write_all(body.as_bytes()).await;
        });

        let api = format!("http://{addr}/api");
        let snapshot = SnapshotSource::Directory(PathBuf::from("/nonexistent"));
        let client = RemoteClient::new(&api, snapshot)
            .unwrap()
            .with_timeout(Duration::from_millis(400));

        let err = client.fetch_article("a1").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_bearer_token_sent() {
        use wiremock::matchers::header;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles/a1"))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(article_json("a1", "Hello")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server)
            .await
            .with_token(SecretString::from("s3cret"));
        assert!(client.fetch_article("a1").await.is_ok());
    }

    #[test]
    fn test_url_for_encodes_segments() {
        let client = RemoteClient::new(
            "https://news.example.com/api/",
            SnapshotSource::Directory(PathBuf::from("/tmp")),
        )
        .unwrap();
        let url = client.url_for(&["articles", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "https://news.example.com/api/articles/a%20b%2Fc");
    }

    #[test]
    fn test_debug_masks_token() {
        let client = RemoteClient::new(
            "https://news.example.com/api",
            SnapshotSource::Directory(PathBuf::from("/tmp")),
        )
        .unwrap()
        .with_token(SecretString::from("super-secret"));
        let debug_output = format!("{:?}", client);
        assert!(!debug_output.contains("super-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
