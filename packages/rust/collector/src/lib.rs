//! Feed collection: the first stage of the Newsdesk pipeline.
//!
//! Every configured feed is fetched and parsed in configuration order. The
//! head of each feed (up to the per-feed limit, in the order the parser
//! returned entries) is appended to one candidate list. A feed that cannot
//! be fetched or parsed is skipped and recorded; it never fails the run.

mod parser;

use std::time::Duration;

use async_trait::async_trait;
use newsdesk_shared::{ErrorClass, FeedEntry, NewsdeskError, Result};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

/// Maximum number of redirects to follow when fetching a feed.
const MAX_REDIRECTS: usize = 5;

/// Default maximum feed body we are willing to parse (10 MB).
pub const MAX_FEED_SIZE: u64 = 10 * 1024 * 1024;

/// User-Agent string for feed requests.
const USER_AGENT: &str = concat!("Newsdesk/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// FeedSource
// ---------------------------------------------------------------------------

/// Anything that can turn a feed URL into its entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`, returning every entry in parser order.
    async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>>;
}

/// Fetches feeds over HTTP and parses them with `feed-rs`.
pub struct HttpFeedSource {
    client: Client,
    max_body_size: u64,
}

impl HttpFeedSource {
    /// Create a feed source whose requests give up after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NewsdeskError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_body_size: MAX_FEED_SIZE,
        })
    }

    /// Reject feed bodies larger than `bytes` instead of [`MAX_FEED_SIZE`].
    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = bytes;
        self
    }
}

fn feed_too_large(url: &str, limit: u64) -> NewsdeskError {
    NewsdeskError::validation(format!("{url}: feed larger than {limit} bytes"))
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let parsed = url::Url::parse(url)
            .map_err(|e| NewsdeskError::validation(format!("invalid feed URL '{url}': {e}")))?;

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| NewsdeskError::network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NewsdeskError::http_status(url, status.as_u16()));
        }

        let limit = self.max_body_size;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(feed_too_large(url, limit));
        }

        // Chunked bodies carry no length up front, so count while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NewsdeskError::network(format!("{url}: failed to read body: {e}")))?
        {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(feed_too_large(url, limit));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(url, bytes = body.len(), "feed downloaded");
        parser::parse_feed(&body, url)
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A feed that was skipped, and why.
#[derive(Debug)]
pub struct FeedFailure {
    /// The feed URL as configured.
    pub url: String,
    /// What went wrong.
    pub error: NewsdeskError,
}

impl FeedFailure {
    /// Whether the feed was unreachable rather than malformed or rejected.
    pub fn is_transient(&self) -> bool {
        self.error.class() == ErrorClass::Transient
    }
}

/// Result of the collection stage.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    /// Candidate entries: configuration order across feeds, parser order within.
    pub entries: Vec<FeedEntry>,
    /// Feeds skipped because of an error, in configuration order.
    pub failures: Vec<FeedFailure>,
}

impl CollectOutcome {
    /// True when no feed contributed a single entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Poll every feed in order and keep the first `per_feed_limit` entries of each.
#[instrument(skip_all, fields(feeds = feeds.len(), per_feed_limit = per_feed_limit))]
pub async fn collect(
    source: &dyn FeedSource,
    feeds: &[String],
    per_feed_limit: usize,
) -> CollectOutcome {
    let mut outcome = CollectOutcome::default();

    for url in feeds {
        match source.fetch_entries(url).await {
            Ok(entries) => {
                let total = entries.len();
                let taken: Vec<FeedEntry> = entries.into_iter().take(per_feed_limit).collect();
                debug!(url = %url, total, taken = taken.len(), "feed collected");
                outcome.entries.extend(taken);
            }
            Err(error) => {
                warn!(url = %url, class = %error.class(), error = %error, "skipping feed");
                outcome.failures.push(FeedFailure {
                    url: url.clone(),
                    error,
                });
            }
        }
    }

    info!(
        entries = outcome.entries.len(),
        failed_feeds = outcome.failures.len(),
        "collection complete"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/feeds/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn entry(source: &str, n: usize) -> FeedEntry {
        FeedEntry {
            title: format!("{source} #{n}"),
            link: format!("https://{source}/{n}"),
            summary: None,
            source: source.to_string(),
            published: None,
        }
    }

    /// In-memory source: URL → entries, anything else is a 404.
    struct StaticSource(HashMap<String, Vec<FeedEntry>>);

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch_entries(&self, url: &str) -> Result<Vec<FeedEntry>> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| NewsdeskError::http_status(url, 404))
        }
    }

    // -----------------------------------------------------------------------
    // collect()
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn caps_each_feed_and_keeps_configuration_order() {
        let source = StaticSource(HashMap::from([
            ("a".to_string(), (0..5).map(|n| entry("a", n)).collect()),
            ("b".to_string(), (0..1).map(|n| entry("b", n)).collect()),
            ("c".to_string(), (0..3).map(|n| entry("c", n)).collect()),
        ]));
        let feeds = vec!["c".to_string(), "a".to_string(), "b".to_string()];

        let outcome = collect(&source, &feeds, 2).await;

        let titles: Vec<&str> = outcome.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["c #0", "c #1", "a #0", "a #1", "b #0"]);
        assert!(outcome.entries.len() <= 2 * feeds.len());
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn failed_feed_is_skipped_and_recorded() {
        let source = StaticSource(HashMap::from([("ok".to_string(), vec![entry("ok", 0)])]));
        let feeds = vec!["down".to_string(), "ok".to_string()];

        let outcome = collect(&source, &feeds, 2).await;

        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].url, "down");
    }

    #[tokio::test]
    async fn all_feeds_failing_yields_empty_outcome() {
        let source = StaticSource(HashMap::new());
        let feeds = vec!["x".to_string(), "y".to_string()];

        let outcome = collect(&source, &feeds, 2).await;

        assert!(outcome.is_empty());
        assert_eq!(outcome.failures.len(), 2);
    }

    // -----------------------------------------------------------------------
    // HttpFeedSource against a mock server
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn http_source_fetches_and_parses_rss() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("rss_three_items.xml"), "application/rss+xml"),
            )
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(5).unwrap();
        let url = format!("{}/rss", server.uri());
        let entries = source.fetch_entries(&url).await.unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].source, url);
    }

    #[tokio::test]
    async fn unreachable_and_malformed_feeds_are_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a feed"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/overloaded"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/atom"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("atom_two_entries.xml"), "application/atom+xml"),
            )
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(5).unwrap();
        let feeds = vec![
            format!("{}/broken", server.uri()),
            format!("{}/overloaded", server.uri()),
            format!("{}/atom", server.uri()),
        ];

        let outcome = collect(&source, &feeds, 2).await;

        assert_eq!(outcome.entries.len(), 2);
        assert_eq!(outcome.failures.len(), 2);

        let malformed = &outcome.failures[0];
        assert!(matches!(malformed.error, NewsdeskError::Parse { .. }));
        assert!(!malformed.is_transient());

        let unavailable = &outcome.failures[1];
        assert!(matches!(
            unavailable.error,
            NewsdeskError::HttpStatus { status: 503, .. }
        ));
        assert!(unavailable.is_transient());
    }

    /// Serve one chunked response (no Content-Length) on a loopback port.
    async fn serve_chunked(chunks: Vec<String>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let mut response = "HTTP/1.1 200 OK\r\ntransfer-encoding: chunked\r\n\r\n".to_string();
            for chunk in &chunks {
                response.push_str(&format!("{:x}\r\n{chunk}\r\n", chunk.len()));
            }
            response.push_str("0\r\n\r\n");
            let _ = socket.write_all(response.as_bytes()).await;
        });
        format!("http://{addr}/feed")
    }

    #[tokio::test]
    async fn advertised_oversized_feed_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("rss_three_items.xml"), "application/rss+xml"),
            )
            .mount(&server)
            .await;

        let source = HttpFeedSource::new(5).unwrap().with_max_body_size(64);
        let err = source
            .fetch_entries(&format!("{}/rss", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, NewsdeskError::Validation { .. }));
        assert!(err.to_string().contains("larger than 64 bytes"));
    }

    #[tokio::test]
    async fn chunked_feed_is_capped_while_streaming() {
        let url = serve_chunked(vec!["a".repeat(40), "b".repeat(40)]).await;

        let source = HttpFeedSource::new(5).unwrap().with_max_body_size(64);
        let err = source.fetch_entries(&url).await.unwrap_err();

        assert!(matches!(err, NewsdeskError::Validation { .. }));
        assert_eq!(err.class(), ErrorClass::Permanent);
    }

    #[tokio::test]
    async fn chunked_feed_within_limit_is_parsed() {
        let rss = fixture("rss_three_items.xml");
        let (head, tail) = rss.split_at(rss.find("<item>").unwrap());
        let url = serve_chunked(vec![head.to_string(), tail.to_string()]).await;

        let source = HttpFeedSource::new(5).unwrap();
        let entries = source.fetch_entries(&url).await.unwrap();

        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn invalid_url_is_a_validation_error() {
        let source = HttpFeedSource::new(5).unwrap();
        let err = source.fetch_entries("not a url").await.unwrap_err();
        assert!(matches!(err, NewsdeskError::Validation { .. }));
    }
}
