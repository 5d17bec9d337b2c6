//! Document store: the only layer that touches the file system.
//!
//! The [`DocumentStore`] trait covers everything the pipeline needs from
//! storage: scanning, reading, writing merged output, removing folded sources,
//! and taking a backup of the whole tree.
//!
//! - [`FsStore`] works on a real directory tree.
//! - [`MemoryStore`] keeps documents in memory for tests and dry experiments.
//!
//! Paths crossing this boundary are always root-relative and `/`-separated.

mod fs;
mod memory;
pub mod reader;

use std::path::PathBuf;

use docmerge_shared::{AppConfig, Document, Result};

pub use fs::FsStore;
pub use memory::{MemoryStore, StoreOp};
pub use reader::read_content;

/// Storage collaborator used by the merge pipeline.
pub trait DocumentStore {
    /// Human-readable location of the document root (for logs and reports).
    fn location(&self) -> String;

    /// List every document admitted by `policy`, ordered by relative path.
    fn scan(&self, policy: &ScanPolicy) -> Result<Vec<Document>>;

    /// Whether a file exists at `relative_path`, admitted by a scan or not.
    fn exists(&self, relative_path: &str) -> bool;

    /// Read the raw bytes of a document.
    fn read_bytes(&self, relative_path: &str) -> std::io::Result<Vec<u8>>;

    /// Create or replace a text file, creating parent directories as needed.
    fn write_text(&self, relative_path: &str, content: &str) -> Result<()>;

    /// Delete a single file.
    fn remove(&self, relative_path: &str) -> Result<()>;

    /// Copy the whole tree to the backup location, replacing any previous backup.
    /// Returns where the backup was written.
    fn backup(&self) -> Result<PathBuf>;
}

// ---------------------------------------------------------------------------
// Scan policy
// ---------------------------------------------------------------------------

/// Which directories and files a scan admits.
#[derive(Debug, Clone)]
pub struct ScanPolicy {
    /// Lowercase extensions without the dot.
    pub extensions: Vec<String>,
    /// Directories starting with this prefix are skipped.
    pub skip_dir_prefix: String,
    /// Directory names skipped entirely.
    pub excluded_dirs: Vec<String>,
    /// Files whose stem ends with this suffix are merged output and never admitted.
    pub merged_suffix: String,
    /// Exact file names never admitted (e.g. the run report).
    pub excluded_files: Vec<String>,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ScanPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            extensions: config
                .scan
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            skip_dir_prefix: config.scan.skip_dir_prefix.clone(),
            excluded_dirs: config.scan.excluded_dirs.clone(),
            merged_suffix: config.scan.merged_suffix.clone(),
            excluded_files: vec![config.defaults.report_file.clone()],
        }
    }
}

impl ScanPolicy {
    /// Whether a directory with this name is descended into.
    pub fn admits_dir(&self, name: &str) -> bool {
        if !self.skip_dir_prefix.is_empty() && name.starts_with(&self.skip_dir_prefix) {
            return false;
        }
        !self.excluded_dirs.iter().any(|d| d == name)
    }

    /// Check the file part of a relative path; directories are not inspected.
    pub fn admits_file(&self, relative_path: &str) -> Option<Document> {
        let doc = Document::from_relative(relative_path)?;

        if !self.extensions.iter().any(|e| e == doc.format.extension()) {
            return None;
        }
        if doc.name.ends_with(&self.merged_suffix) {
            return None;
        }
        if self.excluded_files.iter().any(|f| *f == doc.file_name) {
            return None;
        }
        Some(doc)
    }

    /// Check a full relative path: every directory component and the file.
    pub fn admits_path(&self, relative_path: &str) -> Option<Document> {
        let doc = self.admits_file(relative_path)?;
        let parent = doc.parent_dir();
        if !parent.is_empty() && !parent.split('/').all(|dir| self.admits_dir(dir)) {
            return None;
        }
        Some(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_admits_supported_formats() {
        let policy = ScanPolicy::default();
        assert!(policy.admits_path("a.md").is_some());
        assert!(policy.admits_path("sub/b.TXT").is_some());
        assert!(policy.admits_path("c.docx").is_some());
        assert!(policy.admits_path("d.doc").is_some());
        assert!(policy.admits_path("e.pdf").is_none());
    }

    #[test]
    fn policy_skips_hidden_and_archived_dirs() {
        let policy = ScanPolicy::default();
        assert!(policy.admits_path(".git/notes.md").is_none());
        assert!(policy.admits_path("_archived/old.md").is_none());
        assert!(policy.admits_path("deep/_backup/old.md").is_none());
        assert!(policy.admits_path("archive/old.md").is_some());
    }

    #[test]
    fn policy_excludes_merged_output_and_report() {
        let policy = ScanPolicy::default();
        assert!(policy.admits_path("预算管理-merged.md").is_none());
        assert!(policy.admits_path("sub/UI界面-merged.md").is_none());
        assert!(policy.admits_path("docmerge-report.md").is_none());
        assert!(policy.admits_path("sub/docmerge-report.md").is_none());
        assert!(policy.admits_path("merged-notes.md").is_some());
    }

    #[test]
    fn policy_respects_configured_extensions() {
        let mut config = AppConfig::default();
        config.scan.extensions = vec![".MD".into()];
        let policy = ScanPolicy::from(&config);
        assert!(policy.admits_path("a.md").is_some());
        assert!(policy.admits_path("a.txt").is_none());
    }
}
