//! Versioned remote file storage.
//!
//! [`ContentStore`] is the seam the publisher writes through. Every write is a
//! compare-and-swap: updates carry the version token read earlier, creates
//! carry none, and the store rejects either when the remote has moved on.
//! [`GitHubContentStore`] implements it over the GitHub repository contents API.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use newsdesk_shared::{NewsdeskError, PageState, RepoSlug, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// User-Agent string for content API requests. GitHub rejects requests without one.
const USER_AGENT: &str = concat!("Newsdesk/", env!("CARGO_PKG_VERSION"));

/// Media type GitHub recommends for REST calls.
const ACCEPT: &str = "application/vnd.github+json";

/// Pinned REST API version.
const API_VERSION: &str = "2022-11-28";

// ---------------------------------------------------------------------------
// ContentStore
// ---------------------------------------------------------------------------

/// A remote file store with optimistic concurrency.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read the file at `path`. Fails with [`NewsdeskError::NotFound`] when it does not exist.
    async fn read(&self, path: &str) -> Result<PageState>;

    /// Create `path`. Fails with [`NewsdeskError::Conflict`] if it already exists.
    async fn create(&self, path: &str, content: &str, message: &str) -> Result<()>;

    /// Replace `path`, provided its current version is still `version_token`.
    async fn update(
        &self,
        path: &str,
        content: &str,
        version_token: &str,
        message: &str,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// GitHubContentStore
// ---------------------------------------------------------------------------

/// Settings for [`GitHubContentStore`].
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    /// REST API base, e.g. `https://api.github.com`.
    pub api_base: String,
    /// Token sent as a bearer credential. Empty means anonymous.
    pub token: String,
    /// Target repository.
    pub repository: RepoSlug,
    /// Branch to read and commit to. `None` uses the repository default.
    pub branch: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// [`ContentStore`] backed by `/repos/{owner}/{repo}/contents/{path}`.
pub struct GitHubContentStore {
    client: Client,
    api_base: Url,
    token: String,
    repository: RepoSlug,
    branch: Option<String>,
}

impl GitHubContentStore {
    /// Build a store from settings.
    pub fn new(settings: GitHubSettings) -> Result<Self> {
        let api_base = Url::parse(&settings.api_base).map_err(|e| {
            NewsdeskError::config(format!("invalid GitHub API base '{}': {e}", settings.api_base))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(NewsdeskError::config(format!(
                "GitHub API base '{}' cannot carry a path",
                settings.api_base
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| NewsdeskError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            token: settings.token,
            repository: settings.repository,
            branch: settings.branch,
        })
    }

    /// The repository this store writes to.
    pub fn repository(&self) -> &RepoSlug {
        &self.repository
    }

    /// `{api_base}/repos/{owner}/{repo}/contents/{path}`, each segment escaped.
    fn contents_url(&self, path: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| NewsdeskError::config("GitHub API base cannot carry a path"))?;
            segments.pop_if_empty().extend([
                "repos",
                self.repository.owner.as_str(),
                self.repository.name.as_str(),
                "contents",
            ]);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION);
        if self.token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.token)
        }
    }

    async fn put(&self, path: &str, body: &PutContentsRequest<'_>) -> Result<()> {
        let url = self.contents_url(path)?;
        let response = self
            .authorize(self.client.put(url))
            .json(body)
            .send()
            .await
            .map_err(|e| NewsdeskError::network(format!("write {path}: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(path, status = status.as_u16(), "content written");
            return Ok(());
        }

        match status {
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let detail: ApiMessage = response.json().await.unwrap_or_default();
                Err(NewsdeskError::Conflict {
                    path: path.to_string(),
                    message: if detail.message.is_empty() {
                        format!("HTTP {}", status.as_u16())
                    } else {
                        detail.message
                    },
                })
            }
            _ => Err(NewsdeskError::http_status(format!("write {path}"), status.as_u16())),
        }
    }
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    async fn read(&self, path: &str) -> Result<PageState> {
        let mut url = self.contents_url(path)?;
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| NewsdeskError::network(format!("read {path}: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(NewsdeskError::NotFound {
                path: path.to_string(),
            });
        }
        if !status.is_success() {
            return Err(NewsdeskError::http_status(format!("read {path}"), status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| NewsdeskError::network(format!("{path}: failed to read body: {e}")))?;
        let body: ContentsResponse = serde_json::from_str(&text)
            .map_err(|e| NewsdeskError::parse(format!("contents response for {path}: {e}")))?;

        let content = decode_content(path, &body)?;
        debug!(path, bytes = content.len(), sha = %body.sha, "content read");

        Ok(PageState {
            content,
            version_token: Some(body.sha),
        })
    }

    async fn create(&self, path: &str, content: &str, message: &str) -> Result<()> {
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            sha: None,
            branch: self.branch.as_deref(),
        };
        self.put(path, &body).await
    }

    async fn update(
        &self,
        path: &str,
        content: &str,
        version_token: &str,
        message: &str,
    ) -> Result<()> {
        let body = PutContentsRequest {
            message,
            content: STANDARD.encode(content),
            sha: Some(version_token),
            branch: self.branch.as_deref(),
        };
        self.put(path, &body).await
    }
}

/// Decode the base64 payload. GitHub wraps it with newlines every 60 columns.
fn decode_content(path: &str, body: &ContentsResponse) -> Result<String> {
    match body.encoding.as_deref() {
        None | Some("base64") => {}
        Some(other) => {
            return Err(NewsdeskError::validation(format!(
                "{path}: unsupported content encoding '{other}'"
            )));
        }
    }

    let packed: String = body
        .content
        .as_deref()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(packed.as_bytes())
        .map_err(|e| NewsdeskError::parse(format!("{path}: invalid base64 content: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|e| NewsdeskError::parse(format!("{path}: content is not UTF-8: {e}")))
}
