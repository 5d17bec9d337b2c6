//! Shared types, error model, and configuration for docmerge.
//!
//! This crate is the foundation depended on by all other docmerge crates.
//! It provides:
//! - [`DocMergeError`] — the unified error type
//! - Domain types ([`Document`], [`LoadedDocument`], [`ThemeGroup`], [`MergeResult`], [`RunReport`])
//! - Configuration ([`AppConfig`] and its sections, config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ClassifierConfig, DefaultsConfig, ImportanceConfig, KeywordWeight,
    MergeRulesConfig, OutputPlacement, ScanConfig, SizeTier, StructureWeights, ThemeDef,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{DocMergeError, Result};
pub use types::{
    DocFormat, Document, LoadedDocument, MergeOutcome, MergeResult, RunId, RunReport, ThemeGroup,
};
