//! Pipeline orchestration for Newsdesk.
//!
//! This crate ties together collection, summarization, and publishing into a
//! single run (`run_pipeline`), and wires the production clients from config.

pub mod live;
pub mod pipeline;

pub use live::LiveServices;
pub use pipeline::{
    PipelineConfig, ProgressReporter, RunOutcome, RunReport, Services, SilentProgress,
    run_pipeline,
};
