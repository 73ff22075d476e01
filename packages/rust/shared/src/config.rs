//! Application configuration for Newsdesk.
//!
//! User config lives at `~/.newsdesk/newsdesk.toml`.
//! Environment variables supply credentials and the target repository;
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NewsdeskError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsdesk.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsdesk";

/// Feed sources polled on every run, in this order.
pub const DEFAULT_FEEDS: &[&str] = &[
    "https://techcrunch.com/category/artificial-intelligence/feed/",
    "https://www.producthunt.com/feed",
    "https://venturebeat.com/category/ai/feed/",
    "https://www.theverge.com/rss/index.xml",
];

// ---------------------------------------------------------------------------
// Config structs (matching newsdesk.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run-wide limits.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Target page settings.
    #[serde(default)]
    pub page: PageConfig,

    /// Completion service settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Content store settings.
    #[serde(default)]
    pub github: GitHubConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Entries taken from the head of each feed.
    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,

    /// Entries summarized per run, across all feeds.
    #[serde(default = "default_run_limit")]
    pub run_limit: usize,

    /// HTTP request timeout in seconds, applied to every collaborator.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            per_feed_limit: default_per_feed_limit(),
            run_limit: default_run_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_per_feed_limit() -> usize {
    2
}
fn default_run_limit() -> usize {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

/// What happens to the insertion marker when new articles are spliced in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPolicy {
    /// Keep the marker in place, ahead of the newly inserted articles.
    #[default]
    Retain,
    /// Drop the marker; later runs rebuild the page from the template.
    Consume,
}

/// `[page]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Path of the HTML page inside the repository.
    #[serde(default = "default_page_path")]
    pub path: String,

    /// Branch to read from and commit to (repository default when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Insertion marker handling.
    #[serde(default)]
    pub marker_policy: MarkerPolicy,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            path: default_page_path(),
            branch: None,
            marker_policy: MarkerPolicy::default(),
        }
    }
}

fn default_page_path() -> String {
    "index.html".into()
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Model used for every summary.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            model: default_model(),
            base_url: default_openai_base_url(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Name of the env var holding the access token.
    #[serde(default = "default_github_token_env")]
    pub token_env: String,

    /// Name of the env var holding the `owner/name` repository slug.
    #[serde(default = "default_repository_env")]
    pub repository_env: String,

    /// Base URL of the GitHub REST API.
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token_env: default_github_token_env(),
            repository_env: default_repository_env(),
            api_base: default_github_api_base(),
        }
    }
}

fn default_github_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_repository_env() -> String {
    "GITHUB_REPOSITORY".into()
}
fn default_github_api_base() -> String {
    "https://api.github.com".into()
}

impl AppConfig {
    /// Reject limits that would make every run a no-op.
    pub fn validate(&self) -> Result<()> {
        if self.defaults.per_feed_limit == 0 {
            return Err(NewsdeskError::validation("per_feed_limit must be at least 1"));
        }
        if self.defaults.run_limit == 0 {
            return Err(NewsdeskError::validation("run_limit must be at least 1"));
        }
        if self.defaults.timeout_secs == 0 {
            return Err(NewsdeskError::validation("timeout_secs must be at least 1"));
        }
        if self.page.path.trim().is_empty() {
            return Err(NewsdeskError::validation("page path must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Runtime values resolved from the environment
// ---------------------------------------------------------------------------

/// Pre-supplied API tokens. Missing tokens resolve to empty strings and
/// surface later as rejected calls.
#[derive(Clone, Default)]
pub struct Credentials {
    /// Completion service API key.
    pub openai_api_key: String,
    /// Content store access token.
    pub github_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("github_token", &redact(&self.github_token))
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

/// A GitHub repository identifier, `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = NewsdeskError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(NewsdeskError::config(format!(
                "invalid repository '{trimmed}': expected 'owner/name'"
            ))),
        }
    }
}

impl std::fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Read credentials from the env vars named in the config.
pub fn resolve_credentials(config: &AppConfig) -> Credentials {
    resolve_credentials_with(config, |name| std::env::var(name).ok())
}

fn resolve_credentials_with(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Credentials {
    let read = |var: &str| match lookup(var) {
        Some(val) if !val.is_empty() => val,
        _ => {
            tracing::warn!(var, "credential not set; calls that need it will fail");
            String::new()
        }
    };

    Credentials {
        openai_api_key: read(config.openai.api_key_env.as_str()),
        github_token: read(config.github.token_env.as_str()),
    }
}

/// Resolve the target repository. An explicit value wins over the env var.
///
/// Unlike credentials, a missing repository is fatal: there is nowhere to
/// publish to.
pub fn resolve_repository(config: &AppConfig, explicit: Option<&str>) -> Result<RepoSlug> {
    resolve_repository_with(config, explicit, |name| std::env::var(name).ok())
}

fn resolve_repository_with(
    config: &AppConfig,
    explicit: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RepoSlug> {
    let var_name = &config.github.repository_env;
    let raw = match explicit {
        Some(value) => value.to_string(),
        None => lookup(var_name.as_str()).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
            NewsdeskError::config(format!(
                "target repository not set. Set the {var_name} environment variable \
                 or pass --repo owner/name"
            ))
        })?,
    };
    raw.parse()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsdesk/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsdeskError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.newsdesk/newsdesk.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsdeskError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        NewsdeskError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NewsdeskError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsdeskError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NewsdeskError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
