//! Page publishing: the last stage of the Newsdesk pipeline.
//!
//! Reads the current page and its version token, splices the new articles in
//! (or builds a fresh page), and writes the result back with one
//! compare-and-swap write. A failed read is treated as "no page yet". A
//! rejected write is returned to the caller and never retried.

pub mod page;
mod store;

use newsdesk_shared::{
    ArticleFragment, MarkerPolicy, NewsdeskError, PageState, Result, join_fragments,
};
use tracing::{info, instrument, warn};

pub use page::{INSERTION_MARKER, PAGE_FOOTER, PAGE_HEADER, RenderPath, RenderedPage, render_page};
pub use store::{ContentStore, GitHubContentStore, GitHubSettings};

/// Commit message used when the page already exists.
pub const UPDATE_MESSAGE: &str = "Update news";

/// Commit message used when the page is created.
pub const CREATE_MESSAGE: &str = "Init site";

/// How the page was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// A new file was created.
    Created,
    /// An existing file was replaced.
    Updated,
}

impl std::fmt::Display for WriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
        }
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub write: WriteKind,
    pub render: RenderPath,
    /// Size of the page written, in bytes.
    pub bytes: usize,
}

/// Read the page, treating any read failure as an absent page.
pub async fn load_page(store: &dyn ContentStore, path: &str) -> PageState {
    match store.read(path).await {
        Ok(state) => state,
        Err(NewsdeskError::NotFound { .. }) => {
            info!(path, "page does not exist yet");
            PageState::absent()
        }
        Err(error) => {
            warn!(
                path,
                class = %error.class(),
                error = %error,
                "could not read page, treating it as absent"
            );
            PageState::absent()
        }
    }
}

/// Merge `fragments` into the page at `path` and write it back.
#[instrument(skip_all, fields(path = path, fragments = fragments.len()))]
pub async fn publish(
    store: &dyn ContentStore,
    path: &str,
    fragments: &[ArticleFragment],
    policy: MarkerPolicy,
) -> Result<PublishOutcome> {
    let current = load_page(store, path).await;
    let new_html = join_fragments(fragments);

    let existing = current.exists().then_some(current.content.as_str());
    let rendered = render_page(existing, &new_html, policy);
    if existing.is_some() && rendered.path == RenderPath::Template {
        warn!(
            path,
            "insertion marker missing, rebuilding page from template"
        );
    }

    let write = match current.version_token.as_deref() {
        Some(token) => {
            store
                .update(path, &rendered.html, token, UPDATE_MESSAGE)
                .await?;
            WriteKind::Updated
        }
        None => {
            store.create(path, &rendered.html, CREATE_MESSAGE).await?;
            WriteKind::Created
        }
    };

    info!(path, write = %write, bytes = rendered.html.len(), "page published");

    Ok(PublishOutcome {
        write,
        render: rendered.path,
        bytes: rendered.html.len(),
    })
}
