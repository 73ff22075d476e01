//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use newsdesk_core::{
    LiveServices, PipelineConfig, ProgressReporter, RunOutcome, RunReport, run_pipeline,
};
use newsdesk_shared::{
    AppConfig, DEFAULT_FEEDS, init_config, load_config, load_config_from, resolve_credentials,
    resolve_repository,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Newsdesk: turn RSS feeds into a published news page.
#[derive(Parser)]
#[command(
    name = "newsdesk",
    version,
    about = "Summarize the latest feed entries with an LLM and publish them to a GitHub-hosted page.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.newsdesk/newsdesk.toml.
    #[arg(long, env = "NEWSDESK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Collect, summarize and publish once.
    Run {
        /// Target repository as owner/name (overrides the repository env var).
        #[arg(long)]
        repo: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsdesk=info",
        1 => "newsdesk=debug",
        _ => "newsdesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run { repo } => cmd_run(config_path, repo.as_deref()).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

/// Load from an explicit path, or the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config_path: Option<&Path>, repo: Option<&str>) -> Result<()> {
    let config = resolve_config(config_path)?;

    // No network call happens before the repository is known.
    let repository = resolve_repository(&config, repo)?;
    let credentials = resolve_credentials(&config);

    let live = LiveServices::from_config(&config, &credentials, repository)
        .wrap_err("failed to set up service clients")?;
    let pipeline_config = PipelineConfig::new(DEFAULT_FEEDS, &config);

    info!(
        repository = %live.repository(),
        model = live.model(),
        feeds = pipeline_config.feeds.len(),
        page = %pipeline_config.page_path,
        "starting newsdesk run"
    );

    let reporter = CliProgress::new();
    let report = run_pipeline(live.services(), &pipeline_config, &reporter)
        .await
        .wrap_err_with(|| {
            format!(
                "publishing {} to {} failed",
                pipeline_config.page_path,
                live.repository()
            )
        })?;

    print_summary(&report, &pipeline_config);
    Ok(())
}

fn print_summary(report: &RunReport, config: &PipelineConfig) {
    let outcome = match &report.outcome {
        RunOutcome::NoEntries => "nothing collected, page untouched".to_string(),
        RunOutcome::NoFragments => "no summaries produced, page untouched".to_string(),
        RunOutcome::Published(p) => {
            format!("{} {} ({} bytes)", config.page_path, p.write, p.bytes)
        }
    };

    println!();
    println!("  Run:        {}", report.run_id);
    println!(
        "  Collected:  {} entries ({} feeds skipped)",
        report.collected,
        report.feed_failures.len()
    );
    println!("  Summarized: {}/{}", report.summarized, report.attempted);
    println!("  Page:       {outcome}");
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_started(&self, current: usize, total: usize, title: &str) {
        self.spinner.set_message(format!("Summarizing [{current}/{total}] {title}"));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
