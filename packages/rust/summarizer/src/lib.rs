//! Article summarization: the second stage of the Newsdesk pipeline.
//!
//! Takes the head of the collected entries (up to the run limit), asks the
//! completion service for one HTML `<article>` per entry, and keeps whatever
//! text comes back as-is. A failed request drops that entry; there is no retry.

mod client;
pub mod prompt;

use async_trait::async_trait;
use newsdesk_shared::{ArticleFragment, FeedEntry, NewsdeskError, Result};
use tracing::{debug, info, instrument, warn};

pub use client::{OpenAiClient, OpenAiSettings};

// ---------------------------------------------------------------------------
// CompletionService
// ---------------------------------------------------------------------------

/// A text-generation backend: one system instruction, one user message, one reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate a reply, or fail.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Summarization
// ---------------------------------------------------------------------------

/// An entry that produced no fragment.
#[derive(Debug)]
pub struct ItemFailure {
    /// Link of the entry that failed.
    pub link: String,
    /// What went wrong.
    pub error: NewsdeskError,
}

/// Result of the summarization stage.
#[derive(Debug, Default)]
pub struct SummarizeOutcome {
    /// Fragments in the order their entries were processed.
    pub fragments: Vec<ArticleFragment>,
    /// Entries whose request failed.
    pub failures: Vec<ItemFailure>,
    /// Completion requests issued.
    pub attempted: usize,
}

/// Progress callback for the per-item loop.
pub trait SummarizeProgress: Send + Sync {
    /// Called before each request.
    fn item_started(&self, current: usize, total: usize, title: &str);
}

/// No-op summarize progress.
pub struct SilentSummarizeProgress;

impl SummarizeProgress for SilentSummarizeProgress {
    fn item_started(&self, _current: usize, _total: usize, _title: &str) {}
}

/// Summarize the first `run_limit` entries, one request each, in order.
#[instrument(skip_all, fields(candidates = entries.len(), run_limit = run_limit))]
pub async fn summarize(
    service: &dyn CompletionService,
    entries: &[FeedEntry],
    run_limit: usize,
    progress: &dyn SummarizeProgress,
) -> SummarizeOutcome {
    let batch = &entries[..entries.len().min(run_limit)];
    let mut outcome = SummarizeOutcome::default();

    info!(batch = batch.len(), "summarizing articles");

    for (i, entry) in batch.iter().enumerate() {
        progress.item_started(i + 1, batch.len(), &entry.title);
        outcome.attempted += 1;

        let message = prompt::user_message(entry);
        match service.complete(prompt::SYSTEM_PROMPT, &message).await {
            Ok(text) => {
                debug!(link = %entry.link, chars = text.len(), "article summarized");
                outcome.fragments.push(ArticleFragment::from(text));
            }
            Err(error) => {
                warn!(
                    link = %entry.link,
                    class = %error.class(),
                    error = %error,
                    "summarization failed, dropping article"
                );
                outcome.failures.push(ItemFailure {
                    link: entry.link.clone(),
                    error,
                });
            }
        }
    }

    info!(
        fragments = outcome.fragments.len(),
        failed = outcome.failures.len(),
        "summarization complete"
    );

    outcome
}
