//! End-to-end merge pipeline: scan → read → classify → backup → merge → report.

use std::borrow::Cow;
use std::collections::HashSet;

use chrono::Local;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument, warn};

use docmerge_classifier::{ImportanceScorer, ThemeClassifier, select_master};
use docmerge_markdown::{MergeInput, MergeOptions, merged_file_name, render_merged};
use docmerge_shared::{
    AppConfig, DocMergeError, Document, LoadedDocument, MergeOutcome, MergeResult,
    OutputPlacement, Result, RunId, RunReport, ThemeGroup, validate_config,
};
use docmerge_storage::{DocumentStore, ScanPolicy, read_content};

use crate::report;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Resolved application config (file values over defaults).
    pub app: AppConfig,
    /// Classify and plan only; nothing is backed up, written or removed.
    pub dry_run: bool,
    /// Where merged documents are written.
    pub placement: OutputPlacement,
    /// Whether the unclassified bucket is merged.
    pub merge_unclassified: bool,
    /// Where detailed logs go, quoted in the report.
    pub log_location: Option<String>,
}

impl RunConfig {
    /// Run settings taken from the config file, without CLI overrides.
    pub fn from_app(app: AppConfig) -> Self {
        Self {
            dry_run: false,
            placement: app.defaults.output_placement,
            merge_unclassified: app.defaults.merge_unclassified,
            log_location: None,
            app,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from_app(AppConfig::default())
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each document is read.
    fn document_read(&self, path: &str, current: usize, total: usize);
    /// Called after each theme group is processed.
    fn theme_done(&self, theme: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn document_read(&self, _path: &str, _current: usize, _total: usize) {}
    fn theme_done(&self, _theme: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the full merge pipeline against `store`.
///
/// 1. Scan the tree and read every admitted document once
/// 2. Classify documents into theme groups
/// 3. Back up the whole tree (skipped in dry runs; failure aborts the run)
/// 4. Merge every group with more than one member
/// 5. Write the run report at the root
///
/// Per-theme failures are recorded in the report and never abort the run.
#[instrument(skip_all, fields(root = %store.location(), dry_run = config.dry_run))]
pub fn run(
    config: &RunConfig,
    store: &dyn DocumentStore,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    validate_config(&config.app)?;

    let run_id = RunId::new();
    let started_at = Local::now();
    info!(%run_id, "starting merge run");

    // --- Phase 1: Scan and read ---
    progress.phase("Scanning documents");
    let policy = ScanPolicy::from(&config.app);
    let documents = store.scan(&policy)?;
    let total = documents.len();
    info!(count = total, "documents found");

    progress.phase("Reading documents");
    let loaded: Vec<LoadedDocument> = documents
        .into_iter()
        .enumerate()
        .map(|(i, document)| {
            let content = read_content(store, &document);
            progress.document_read(&document.relative_path, i + 1, total);
            LoadedDocument::new(document, content)
        })
        .collect();

    // --- Phase 2: Classify ---
    progress.phase("Classifying documents");
    let classifier = ThemeClassifier::new(&config.app.classifier);
    let groups = classifier.group(loaded);

    // --- Phase 3: Backup ---
    let backup = if config.dry_run {
        info!("dry run, skipping backup");
        None
    } else {
        progress.phase("Backing up documents");
        let path = store.backup()?;
        info!(path = %path.display(), "backup complete");
        Some(path)
    };

    // --- Phase 4: Merge ---
    progress.phase("Merging themes");
    let merger = ThemeMerger {
        config,
        store,
        scorer: ImportanceScorer::new(&config.app.importance),
        options: MergeOptions::from(&config.app.merge),
        unclassified: classifier.unclassified_label(),
    };

    let group_count = groups.len();
    let mut written = HashSet::new();
    let mut results = Vec::with_capacity(group_count);
    for (i, group) in groups.iter().enumerate() {
        let outcome = merger.process(group, &mut written);
        results.push(MergeResult {
            theme: group.theme.clone(),
            members: group
                .members
                .iter()
                .map(|m| m.document.relative_path.clone())
                .collect(),
            outcome,
        });
        progress.theme_done(&group.theme, i + 1, group_count);
    }

    let mut report = RunReport {
        run_id,
        started_at,
        finished_at: Local::now(),
        root: store.location(),
        backup,
        dry_run: config.dry_run,
        documents_scanned: total,
        results,
        log_location: config.log_location.clone(),
        report_file: None,
    };

    // --- Phase 5: Report ---
    if !config.dry_run {
        progress.phase("Writing report");
        let report_file = &config.app.defaults.report_file;
        match store.write_text(report_file, &report::render_markdown(&report)) {
            Ok(()) => {
                info!(path = %report_file, "report written");
                report.report_file = Some(report_file.clone());
            }
            Err(e) => warn!(error = %e, "failed to write report"),
        }
    }

    info!(
        themes = report.total_themes(),
        successful = report.successful(),
        failed = report.failed(),
        "merge run complete"
    );
    progress.done(&report);

    Ok(report)
}

/// Per-theme merge step, sharing the scorer and rules across groups.
struct ThemeMerger<'a> {
    config: &'a RunConfig,
    store: &'a dyn DocumentStore,
    scorer: ImportanceScorer,
    options: MergeOptions,
    unclassified: &'a str,
}

impl ThemeMerger<'_> {
    fn process(&self, group: &ThemeGroup, written: &mut HashSet<String>) -> MergeOutcome {
        if group.theme == self.unclassified && !self.config.merge_unclassified {
            debug!(theme = %group.theme, "unclassified documents left in place");
            return MergeOutcome::Skipped {
                reason: "unclassified documents are not merged".into(),
            };
        }

        if group.members.len() < 2 {
            info!(theme = %group.theme, "single document, skipping merge");
            return MergeOutcome::Skipped {
                reason: "single document".into(),
            };
        }

        let Some(choice) = select_master(&self.scorer, &group.members) else {
            return MergeOutcome::Failed {
                error: "no master document could be selected".into(),
            };
        };
        let planned_master = &group.members[choice.index].document;
        let output = self.output_path(&group.theme, planned_master.parent_dir());
        if !written.insert(output.clone()) {
            error!(theme = %group.theme, %output, "merged output collides with another theme");
            return MergeOutcome::Failed {
                error: format!("output '{output}' already written by another theme in this run"),
            };
        }

        if self.config.dry_run {
            return MergeOutcome::Planned {
                master: planned_master.relative_path.clone(),
                source_count: group.members.len(),
            };
        }

        let members = match self.with_previous_output(group, &output) {
            Ok(members) => members,
            Err(e) => {
                error!(theme = %group.theme, error = %e, "cannot fold in previous merged document");
                return MergeOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };
        let Some(choice) = select_master(&self.scorer, &members) else {
            return MergeOutcome::Failed {
                error: "no master document could be selected".into(),
            };
        };
        let master = &members[choice.index].document;

        info!(theme = %group.theme, count = members.len(), master = %master.relative_path, "merging theme");

        let input = MergeInput {
            theme: &group.theme,
            documents: &members,
            master: choice.index,
            merged_at: Local::now(),
        };
        let content = match render_merged(&input, &self.options) {
            Ok(content) => content,
            Err(e) => {
                error!(theme = %group.theme, error = %e, "render failed");
                return MergeOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        if let Err(e) = self.store.write_text(&output, &content) {
            error!(theme = %group.theme, error = %e, "failed to write merged document");
            return MergeOutcome::Failed {
                error: e.to_string(),
            };
        }

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let sha256 = format!("{:x}", hasher.finalize());

        // Sources are removed only once the merged document is on disk.
        let mut removed = Vec::new();
        let mut failed_removals = Vec::new();
        for member in members.iter() {
            let path = &member.document.relative_path;
            if *path == output {
                continue;
            }
            match self.store.remove(path) {
                Ok(()) => {
                    debug!(%path, "removed source document");
                    removed.push(path.clone());
                }
                Err(e) => {
                    warn!(%path, error = %e, "failed to remove source document");
                    failed_removals.push(path.clone());
                }
            }
        }

        info!(
            theme = %group.theme,
            %output,
            removed = removed.len(),
            failed = failed_removals.len(),
            "theme merged"
        );

        MergeOutcome::Merged {
            output,
            master: master.relative_path.clone(),
            source_count: members.len(),
            sha256,
            removed,
            failed_removals,
        }
    }

    /// The group's members, plus the merged document a previous run left at
    /// `output`. Scans never admit that file, so it is folded in here rather
    /// than overwritten.
    fn with_previous_output<'g>(
        &self,
        group: &'g ThemeGroup,
        output: &str,
    ) -> Result<Cow<'g, [LoadedDocument]>> {
        if !self.store.exists(output) {
            return Ok(Cow::Borrowed(&group.members));
        }

        let unreadable = |reason: String| {
            DocMergeError::merge(
                &group.theme,
                format!("existing '{output}' cannot be read ({reason}); refusing to overwrite it"),
            )
        };
        let document = Document::from_relative(output)
            .ok_or_else(|| unreadable("unsupported file name".into()))?;
        let bytes = self
            .store
            .read_bytes(output)
            .map_err(|e| unreadable(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| unreadable(e.to_string()))?;

        info!(theme = %group.theme, %output, "folding in previous merged document");
        let mut members = group.members.clone();
        members.push(LoadedDocument::new(
            document,
            text.trim_start_matches('\u{feff}'),
        ));
        Ok(Cow::Owned(members))
    }

    /// Relative path of the merged document for `theme`.
    fn output_path(&self, theme: &str, master_dir: &str) -> String {
        let name = merged_file_name(theme, &self.config.app.scan.merged_suffix);
        match self.config.placement {
            OutputPlacement::AlongsideMaster if !master_dir.is_empty() => {
                format!("{master_dir}/{name}")
            }
            _ => name,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
