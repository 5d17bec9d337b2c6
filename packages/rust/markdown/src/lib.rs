//! Merged-document rendering.
//!
//! A theme group is folded into one Markdown document: a provenance header,
//! the master's full (cleaned) content, key excerpts from every other
//! substantive document, and a manifest of all sources.

mod cleanup;
pub mod extract;
pub mod provenance;

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use tracing::{debug, instrument};

use docmerge_shared::{DocMergeError, LoadedDocument, MergeRulesConfig, Result};

pub use extract::{KeySectionRules, extract_key_sections};
pub use provenance::{clean_title, is_provenance_line, strip_provenance};

use provenance::{
    COMPLETED_AT_LABEL, MASTER_LABEL, MERGED_AT_LABEL, SOURCE_COUNT_LABEL, THEME_LABEL,
};

/// Timestamp format used in headers and footers.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One theme group ready to be merged.
#[derive(Debug, Clone, Copy)]
pub struct MergeInput<'a> {
    pub theme: &'a str,
    /// Every member of the group, in group order.
    pub documents: &'a [LoadedDocument],
    /// Index of the master within `documents`.
    pub master: usize,
    pub merged_at: DateTime<Local>,
}

/// Rules for folding secondary documents.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Secondary documents need more than this many trimmed characters to be excerpted.
    pub min_substantive_chars: usize,
    pub key_rules: KeySectionRules,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::from(&MergeRulesConfig::default())
    }
}

impl From<&MergeRulesConfig> for MergeOptions {
    fn from(config: &MergeRulesConfig) -> Self {
        Self {
            min_substantive_chars: config.min_substantive_chars,
            key_rules: KeySectionRules::from(config),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// File name of the merged document for `theme`.
///
/// Every character that is not alphanumeric, `-` or `_` becomes `_`.
pub fn merged_file_name(theme: &str, merged_suffix: &str) -> String {
    let safe: String = theme
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}{merged_suffix}.md")
}

/// Render the merged document for one theme group.
#[instrument(skip_all, fields(theme = input.theme, documents = input.documents.len()))]
pub fn render_merged(input: &MergeInput<'_>, options: &MergeOptions) -> Result<String> {
    let master = input.documents.get(input.master).ok_or_else(|| {
        DocMergeError::merge(
            input.theme,
            format!(
                "master index {} out of range for {} documents",
                input.master,
                input.documents.len()
            ),
        )
    })?;

    let count = input.documents.len();
    let stamp = input.merged_at.format(TIMESTAMP_FORMAT).to_string();
    let mut title = clean_title(&master.document.name);
    if title.is_empty() {
        title = input.theme.to_string();
    }

    let mut out = String::new();

    // Header
    let _ = writeln!(out, "# {title}\n");
    let _ = writeln!(out, "> {THEME_LABEL} {}", input.theme);
    let _ = writeln!(out, "> 本文档由 {count} 个相关文档合并而成");
    let _ = writeln!(out, "> {MERGED_AT_LABEL} {stamp}");
    let _ = writeln!(out, "> {SOURCE_COUNT_LABEL} {count}");
    let _ = writeln!(out, "> {MASTER_LABEL} {}", master.document.file_name);
    out.push_str("\n---\n\n");

    // Master content
    let body = cleanup::clean_master(&master.content);
    if !body.trim().is_empty() {
        out.push_str("## 主要内容\n\n");
        out.push_str(&body);
        out.push_str("\n\n---\n\n");
    }

    // Secondary documents
    let others: Vec<&LoadedDocument> = input
        .documents
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != input.master)
        .map(|(_, doc)| doc)
        .collect();

    if !others.is_empty() {
        out.push_str("## 补充信息\n\n");
        for (i, doc) in others.iter().enumerate() {
            let content = strip_provenance(&doc.content);
            if content.trim().chars().count() <= options.min_substantive_chars {
                debug!(path = %doc.document.relative_path, "too short to excerpt");
                continue;
            }

            let _ = writeln!(out, "### {}. 来源: {}\n", i + 1, doc.document.file_name);
            let excerpt = extract_key_sections(&content, &options.key_rules);
            if !excerpt.trim().is_empty() {
                out.push_str(&excerpt);
                out.push_str("\n\n");
            }
        }
    }

    // Manifest
    out.push_str("## 原始文档列表\n\n");
    for (i, doc) in input.documents.iter().enumerate() {
        let _ = writeln!(out, "{}. `{}`", i + 1, doc.document.relative_path);
    }
    let _ = write!(out, "\n---\n\n*{COMPLETED_AT_LABEL} {stamp}*");

    Ok(cleanup::ensure_trailing_newline(&out))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
