//! Core pipeline orchestration for docmerge.
//!
//! This crate ties together scanning, classification, master selection and
//! merged-document rendering into one run (see [`pipeline::run`]), and renders
//! the run report.

pub mod pipeline;
pub mod report;

pub use pipeline::{ProgressReporter, RunConfig, SilentProgress, run};
pub use report::render_markdown;
