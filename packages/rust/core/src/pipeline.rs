//! End-to-end run: feeds → entries → article fragments → published page.

use std::time::{Duration, Instant};

use tracing::{Span, field, info, instrument};

use newsdesk_collector::{FeedFailure, FeedSource};
use newsdesk_publisher::{ContentStore, PublishOutcome};
use newsdesk_shared::{AppConfig, MarkerPolicy, Result, RunId};
use newsdesk_summarizer::{CompletionService, ItemFailure, SummarizeProgress};

/// Configuration for a single run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Feed URLs, polled in order.
    pub feeds: Vec<String>,
    /// Entries kept from the head of each feed.
    pub per_feed_limit: usize,
    /// Completion requests issued per run.
    pub run_limit: usize,
    /// Page path inside the repository.
    pub page_path: String,
    /// Insertion marker handling.
    pub marker_policy: MarkerPolicy,
}

impl PipelineConfig {
    /// Combine a feed list with the limits and page settings from `config`.
    pub fn new<S: AsRef<str>>(feeds: &[S], config: &AppConfig) -> Self {
        Self {
            feeds: feeds.iter().map(|f| f.as_ref().to_string()).collect(),
            per_feed_limit: config.defaults.per_feed_limit,
            run_limit: config.defaults.run_limit,
            page_path: config.page.path.clone(),
            marker_policy: config.page.marker_policy,
        }
    }
}

/// The three collaborators a run talks to.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub feeds: &'a dyn FeedSource,
    pub completions: &'a dyn CompletionService,
    pub store: &'a dyn ContentStore,
}

/// How a run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// No feed yielded an entry. Nothing was summarized or written.
    NoEntries,
    /// Every summarization failed. The page was left untouched.
    ///
    /// No write is issued in this case, not even one carrying an empty batch,
    /// so a run that produced nothing never creates a commit.
    NoFragments,
    /// The page was written.
    Published(PublishOutcome),
}

/// Result of [`run_pipeline`].
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    /// Entries collected across all feeds.
    pub collected: usize,
    /// Feeds skipped because they could not be fetched or parsed.
    pub feed_failures: Vec<FeedFailure>,
    /// Completion requests issued.
    pub attempted: usize,
    /// Fragments produced.
    pub summarized: usize,
    /// Entries whose summarization failed.
    pub item_failures: Vec<ItemFailure>,
    pub outcome: RunOutcome,
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether the page was written by this run.
    pub fn published(&self) -> bool {
        matches!(self.outcome, RunOutcome::Published(_))
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before each completion request.
    fn item_started(&self, current: usize, total: usize, title: &str);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_started(&self, _current: usize, _total: usize, _title: &str) {}
    fn done(&self, _report: &RunReport) {}
}

/// Forwards per-item summarizer progress to the run reporter.
struct ItemProgress<'a>(&'a dyn ProgressReporter);

impl SummarizeProgress for ItemProgress<'_> {
    fn item_started(&self, current: usize, total: usize, title: &str) {
        self.0.item_started(current, total, title);
    }
}

/// Run the full pipeline once.
///
/// 1. Collect: poll every feed, keep the head of each
/// 2. Summarize: one completion per entry, up to the run limit
/// 3. Publish: splice fragments into the page, one conditional write
///
/// Only the publish write can fail the run.
#[instrument(skip_all, fields(run_id = tracing::field::Empty, feeds = config.feeds.len()))]
pub async fn run_pipeline(
    services: Services<'_>,
    config: &PipelineConfig,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    let start = Instant::now();
    let run_id = RunId::new();
    Span::current().record("run_id", field::display(run_id));

    info!(%run_id, "starting run");

    // --- Phase 1: Collect ---
    progress.phase("Collecting feeds");
    let collected =
        newsdesk_collector::collect(services.feeds, &config.feeds, config.per_feed_limit).await;

    let mut report = RunReport {
        run_id,
        collected: collected.entries.len(),
        feed_failures: collected.failures,
        attempted: 0,
        summarized: 0,
        item_failures: Vec::new(),
        outcome: RunOutcome::NoEntries,
        elapsed: Duration::ZERO,
    };

    if collected.entries.is_empty() {
        info!("no entries collected, nothing to publish");
        return Ok(finish(report, start, progress));
    }

    // --- Phase 2: Summarize ---
    progress.phase("Summarizing articles");
    let summarized = newsdesk_summarizer::summarize(
        services.completions,
        &collected.entries,
        config.run_limit,
        &ItemProgress(progress),
    )
    .await;

    report.attempted = summarized.attempted;
    report.summarized = summarized.fragments.len();
    report.item_failures = summarized.failures;

    if summarized.fragments.is_empty() {
        info!(
            attempted = report.attempted,
            "no article fragments, leaving page untouched"
        );
        report.outcome = RunOutcome::NoFragments;
        return Ok(finish(report, start, progress));
    }

    // --- Phase 3: Publish ---
    progress.phase("Publishing page");
    let published = newsdesk_publisher::publish(
        services.store,
        &config.page_path,
        &summarized.fragments,
        config.marker_policy,
    )
    .await?;

    report.outcome = RunOutcome::Published(published);
    Ok(finish(report, start, progress))
}

fn finish(mut report: RunReport, start: Instant, progress: &dyn ProgressReporter) -> RunReport {
    report.elapsed = start.elapsed();
    info!(
        run_id = %report.run_id,
        collected = report.collected,
        summarized = report.summarized,
        published = report.published(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "run complete"
    );
    progress.done(&report);
    report
}
