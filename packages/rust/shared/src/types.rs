//! Core domain types for docmerge runs.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
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
// Documents
// ---------------------------------------------------------------------------

/// Document formats admitted by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    Markdown,
    PlainText,
    Docx,
    Doc,
}

impl DocFormat {
    /// Map a file extension (without the dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "md" => Some(Self::Markdown),
            "txt" => Some(Self::PlainText),
            "docx" => Some(Self::Docx),
            "doc" => Some(Self::Doc),
            _ => None,
        }
    }

    /// Canonical lowercase extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::PlainText => "txt",
            Self::Docx => "docx",
            Self::Doc => "doc",
        }
    }

    /// Whether the content can be decoded as text. Word formats are read by name only.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Markdown | Self::PlainText)
    }
}

/// A document found in the input tree. Identity is its relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the document root, `/`-separated.
    pub relative_path: String,
    /// File name including extension.
    pub file_name: String,
    /// File stem (name without extension).
    pub name: String,
    /// Format derived from the extension.
    pub format: DocFormat,
}

impl Document {
    /// Build a document from a root-relative path.
    ///
    /// Returns `None` when the extension is not one of the supported formats.
    pub fn from_relative(relative_path: &str) -> Option<Self> {
        let relative_path = relative_path.replace('\\', "/");
        let relative_path = relative_path.trim_start_matches('/').to_string();
        let file_name = relative_path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())?
            .to_string();

        let (name, ext) = file_name.rsplit_once('.')?;
        if name.is_empty() {
            return None;
        }
        let format = DocFormat::from_extension(ext)?;

        Some(Self {
            name: name.to_string(),
            file_name: file_name.clone(),
            relative_path,
            format,
        })
    }

    /// Directory part of the relative path (empty for documents at the root).
    pub fn parent_dir(&self) -> &str {
        match self.relative_path.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        }
    }
}

/// A document paired with the content read for this run.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub document: Document,
    pub content: String,
}

impl LoadedDocument {
    pub fn new(document: Document, content: impl Into<String>) -> Self {
        Self {
            document,
            content: content.into(),
        }
    }

    /// Content length in characters.
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// All documents classified into one theme during a single pass.
#[derive(Debug, Clone)]
pub struct ThemeGroup {
    pub theme: String,
    pub members: Vec<LoadedDocument>,
}

// ---------------------------------------------------------------------------
// Merge results and run report
// ---------------------------------------------------------------------------

/// What happened to one theme group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// A merged document was written.
    Merged {
        /// Relative path of the merged document.
        output: String,
        /// Relative path of the chosen master document.
        master: String,
        /// Number of documents folded into the output.
        source_count: usize,
        /// SHA-256 of the merged content.
        sha256: String,
        /// Sources removed after the write.
        removed: Vec<String>,
        /// Sources that could not be removed (left in place).
        failed_removals: Vec<String>,
    },
    /// Nothing to merge; counts as success.
    Skipped { reason: String },
    /// Dry run: what would have been merged.
    Planned { master: String, source_count: usize },
    /// The merge for this theme failed; other themes were unaffected.
    Failed { error: String },
}

/// Per-theme entry of the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeResult {
    pub theme: String,
    pub members: Vec<String>,
    pub outcome: MergeOutcome,
}

impl MergeResult {
    /// Whether this theme counts as successful.
    pub fn success(&self) -> bool {
        !matches!(self.outcome, MergeOutcome::Failed { .. })
    }

    /// Relative path of the merged document, if one was written.
    pub fn output(&self) -> Option<&str> {
        match &self.outcome {
            MergeOutcome::Merged { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    /// Human-readable location of the document root.
    pub root: String,
    /// Where the backup was written (absent in dry runs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
    pub dry_run: bool,
    pub documents_scanned: usize,
    pub results: Vec<MergeResult>,
    /// Where detailed logs were written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_location: Option<String>,
    /// Relative path of the report file, once written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_file: Option<String>,
}

impl RunReport {
    pub fn total_themes(&self) -> usize {
        self.results.len()
    }

    pub fn successful(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total_themes() - self.successful()
    }

    /// Success rate in percent; 100 when there was nothing to do.
    pub fn success_rate(&self) -> f64 {
        match self.total_themes() {
            0 => 100.0,
            total => self.successful() as f64 / total as f64 * 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn document_from_nested_path() {
        let doc = Document::from_relative("analysis-reports/预算对比分析.md").expect("doc");
        assert_eq!(doc.name, "预算对比分析");
        assert_eq!(doc.file_name, "预算对比分析.md");
        assert_eq!(doc.format, DocFormat::Markdown);
        assert_eq!(doc.parent_dir(), "analysis-reports");
    }

    #[test]
    fn document_rejects_unsupported_extension() {
        assert!(Document::from_relative("notes/image.png").is_none());
        assert!(Document::from_relative("README").is_none());
        assert!(Document::from_relative(".md").is_none());
    }

    #[test]
    fn document_extension_is_case_insensitive() {
        let doc = Document::from_relative("Spec.DOCX").expect("doc");
        assert_eq!(doc.format, DocFormat::Docx);
        assert!(!doc.format.is_textual());
        assert_eq!(doc.parent_dir(), "");
    }

    #[test]
    fn content_len_counts_chars() {
        let doc = Document::from_relative("a.md").unwrap();
        let loaded = LoadedDocument::new(doc, "预算abc");
        assert_eq!(loaded.content_len(), 5);
    }

    #[test]
    fn report_counts() {
        let report = RunReport {
            run_id: RunId::new(),
            started_at: Local::now(),
            finished_at: Local::now(),
            root: "docs".into(),
            backup: None,
            dry_run: false,
            documents_scanned: 3,
            results: vec![
                MergeResult {
                    theme: "预算管理".into(),
                    members: vec!["a.md".into(), "b.md".into()],
                    outcome: MergeOutcome::Failed {
                        error: "disk full".into(),
                    },
                },
                MergeResult {
                    theme: "测试相关".into(),
                    members: vec!["c.md".into()],
                    outcome: MergeOutcome::Skipped {
                        reason: "single document".into(),
                    },
                },
            ],
            log_location: None,
            report_file: None,
        };

        assert_eq!(report.total_themes(), 2);
        assert_eq!(report.successful(), 1);
        assert_eq!(report.failed(), 1);
        assert!((report.success_rate() - 50.0).abs() < f64::EPSILON);

        let json = serde_json::to_string(&report).expect("serialize");
        assert!(json.contains("\"status\":\"failed\""));
    }
}
