//! Shared types, error model, and configuration for Newsdesk.
//!
//! This crate is the foundation depended on by all other Newsdesk crates.
//! It provides:
//! - [`NewsdeskError`] is the unified error type, with [`ErrorClass`]
//! - Domain types ([`FeedEntry`], [`ArticleFragment`], [`PageState`], [`RunId`])
//! - Configuration ([`AppConfig`], credentials, repository resolution, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, Credentials, DEFAULT_FEEDS, DefaultsConfig, GitHubConfig, MarkerPolicy,
    OpenAiConfig, PageConfig, RepoSlug, config_dir, config_file_path, init_config, load_config,
    load_config_from, resolve_credentials, resolve_repository,
};
pub use error::{ErrorClass, NewsdeskError, Result};
pub use types::{ArticleFragment, FeedEntry, PageState, RunId, join_fragments};
