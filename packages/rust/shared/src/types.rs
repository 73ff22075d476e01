//! Core domain types handed between the pipeline stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying a single pipeline run (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// FeedEntry
// ---------------------------------------------------------------------------

/// One item taken from a feed, in the order the parser returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Entry title (empty if the feed item had none).
    pub title: String,
    /// Link to the original article (empty if the feed item had none).
    pub link: String,
    /// Summary or description, when the feed provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// URL of the feed this entry came from.
    pub source: String,
    /// Publication timestamp, when the feed provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// Summary text, or the empty string when absent.
    pub fn summary_or_empty(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// ArticleFragment
// ---------------------------------------------------------------------------

/// Model-generated HTML for a single article. Opaque: never validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleFragment(pub String);

impl ArticleFragment {
    /// The raw fragment text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ArticleFragment {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Concatenate fragments in order, each followed by a newline.
pub fn join_fragments(fragments: &[ArticleFragment]) -> String {
    let mut out = String::with_capacity(fragments.iter().map(|f| f.0.len() + 1).sum());
    for fragment in fragments {
        out.push_str(&fragment.0);
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// PageState
// ---------------------------------------------------------------------------

/// Snapshot of the remote page taken at the start of the publish stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    /// Current page content (empty when the page does not exist).
    pub content: String,
    /// Version token (blob SHA). `None` means the page does not exist yet.
    pub version_token: Option<String>,
}

impl PageState {
    /// State representing a page that does not exist yet.
    pub fn absent() -> Self {
        Self::default()
    }

    /// Whether the page exists remotely.
    pub fn exists(&self) -> bool {
        self.version_token.is_some()
    }
}
