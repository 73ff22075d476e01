//! Production collaborators built from configuration.

use newsdesk_collector::HttpFeedSource;
use newsdesk_publisher::{GitHubContentStore, GitHubSettings};
use newsdesk_shared::{AppConfig, Credentials, RepoSlug, Result};
use newsdesk_summarizer::{OpenAiClient, OpenAiSettings};
use tracing::debug;

use crate::pipeline::Services;

/// HTTP feed source, OpenAI client and GitHub store, owned together.
pub struct LiveServices {
    feeds: HttpFeedSource,
    completions: OpenAiClient,
    store: GitHubContentStore,
}

impl LiveServices {
    /// Build every client. Credentials are passed in, never read here.
    pub fn from_config(
        config: &AppConfig,
        credentials: &Credentials,
        repository: RepoSlug,
    ) -> Result<Self> {
        let timeout_secs = config.defaults.timeout_secs;

        let feeds = HttpFeedSource::new(timeout_secs)?;
        let completions = OpenAiClient::new(OpenAiSettings {
            base_url: config.openai.base_url.clone(),
            api_key: credentials.openai_api_key.clone(),
            model: config.openai.model.clone(),
            timeout_secs,
        })?;
        let store = GitHubContentStore::new(GitHubSettings {
            api_base: config.github.api_base.clone(),
            token: credentials.github_token.clone(),
            repository,
            branch: config.page.branch.clone(),
            timeout_secs,
        })?;

        debug!(
            model = completions.model(),
            repository = %store.repository(),
            timeout_secs,
            "services ready"
        );

        Ok(Self {
            feeds,
            completions,
            store,
        })
    }

    /// Borrow the clients as pipeline services.
    pub fn services(&self) -> Services<'_> {
        Services {
            feeds: &self.feeds,
            completions: &self.completions,
            store: &self.store,
        }
    }

    /// Repository the store publishes to.
    pub fn repository(&self) -> &RepoSlug {
        self.store.repository()
    }

    /// Model requested for every summary.
    pub fn model(&self) -> &str {
        self.completions.model()
    }
}
