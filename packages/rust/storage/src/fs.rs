//! File-system backed [`DocumentStore`].

use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use docmerge_shared::{DocMergeError, Document, Result};

use crate::{DocumentStore, ScanPolicy};

/// Documents living under a directory on disk.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    backup_dir: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, backing up into `backup_dir`.
    ///
    /// The backup directory must lie outside the root, otherwise the copy
    /// would recurse into itself. It must not contain the root either, since
    /// a backup starts by clearing the previous one.
    pub fn open(root: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let backup_dir = backup_dir.into();

        if !root.is_dir() {
            return Err(DocMergeError::config(format!(
                "document root '{}' is not a directory",
                root.display()
            )));
        }

        let abs_root = normalized(&root).map_err(|e| DocMergeError::io(&root, e))?;
        let abs_backup = normalized(&backup_dir).map_err(|e| DocMergeError::io(&backup_dir, e))?;
        if abs_backup.starts_with(&abs_root) {
            return Err(DocMergeError::config(format!(
                "backup directory '{}' must be outside the document root",
                backup_dir.display()
            )));
        }
        if abs_root.starts_with(&abs_backup) {
            return Err(DocMergeError::config(format!(
                "backup directory '{}' must not contain the document root",
                backup_dir.display()
            )));
        }

        Ok(Self { root, backup_dir })
    }

    /// Sibling backup location: `<parent>/<root name><suffix>`.
    pub fn default_backup_dir(root: &Path, suffix: &str) -> PathBuf {
        let abs = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let name = abs
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "docs".to_string());
        let parent = abs.parent().map(Path::to_path_buf).unwrap_or_default();
        parent.join(format!("{name}{suffix}"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Map a relative path onto the root, refusing anything that escapes it.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf> {
        let rel = Path::new(relative_path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative_path.is_empty() {
            return Err(DocMergeError::validation(format!(
                "'{relative_path}' is not a path inside the document root"
            )));
        }
        Ok(self.root.join(rel))
    }
}

impl DocumentStore for FsStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    #[instrument(skip_all, fields(root = %self.root.display()))]
    fn scan(&self, policy: &ScanPolicy) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(DocMergeError::Scan(format!(
                "document root '{}' is not a directory",
                self.root.display()
            )));
        }

        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || policy.admits_dir(&entry.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry during scan");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let rel = relative_string(rel);

            if let Some(doc) = policy.admits_file(&rel) {
                debug!(path = %doc.relative_path, "admitted document");
                documents.push(doc);
            }
        }

        documents.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        info!(count = documents.len(), "scan complete");
        Ok(documents)
    }

    fn exists(&self, relative_path: &str) -> bool {
        self.resolve(relative_path).is_ok_and(|path| path.is_file())
    }

    fn read_bytes(&self, relative_path: &str) -> std::io::Result<Vec<u8>> {
        let path = self
            .resolve(relative_path)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
        std::fs::read(path)
    }

    fn write_text(&self, relative_path: &str, content: &str) -> Result<()> {
        let target = self.resolve(relative_path)?;
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        std::fs::create_dir_all(&parent).map_err(|e| DocMergeError::io(&parent, e))?;

        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let temp = parent.join(format!(".{file_name}.tmp"));

        // Write to temp file first
        std::fs::write(&temp, content).map_err(|e| DocMergeError::io(&temp, e))?;

        // Atomic rename
        if let Err(e) = std::fs::rename(&temp, &target) {
            let _ = std::fs::remove_file(&temp);
            return Err(DocMergeError::io(&target, e));
        }

        debug!(path = %target.display(), size = content.len(), "wrote file");
        Ok(())
    }

    fn remove(&self, relative_path: &str) -> Result<()> {
        let path = self.resolve(relative_path)?;
        std::fs::remove_file(&path).map_err(|e| DocMergeError::io(&path, e))?;
        debug!(path = %path.display(), "removed file");
        Ok(())
    }

    #[instrument(skip_all, fields(root = %self.root.display(), backup = %self.backup_dir.display()))]
    fn backup(&self) -> Result<PathBuf> {
        if self.backup_dir.exists() {
            std::fs::remove_dir_all(&self.backup_dir)
                .map_err(|e| DocMergeError::backup(&self.backup_dir, format!("clear old backup: {e}")))?;
        }

        let mut files = 0usize;
        for entry in WalkDir::new(&self.root) {
            let entry = entry
                .map_err(|e| DocMergeError::backup(&self.backup_dir, format!("walk source: {e}")))?;
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| DocMergeError::backup(&self.backup_dir, e.to_string()))?;
            let dest = self.backup_dir.join(rel);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest).map_err(|e| {
                    DocMergeError::backup(&self.backup_dir, format!("{}: {e}", dest.display()))
                })?;
            } else if entry.file_type().is_file() {
                std::fs::copy(entry.path(), &dest).map_err(|e| {
                    DocMergeError::backup(
                        &self.backup_dir,
                        format!("{}: {e}", entry.path().display()),
                    )
                })?;
                files += 1;
            }
        }

        info!(files, path = %self.backup_dir.display(), "backup created");
        Ok(self.backup_dir.clone())
    }
}

/// Absolute form of `path` with `.`/`..` folded and symlinks resolved for the
/// longest prefix that exists.
fn normalized(path: &Path) -> std::io::Result<PathBuf> {
    let mut lexical = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(mut resolved) = std::fs::canonicalize(existing) {
            resolved.extend(missing.iter().rev());
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(lexical),
        }
    }
}

/// Join path components with `/` regardless of platform.
fn relative_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "docmerge-fs-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn make_store(base: &Path) -> FsStore {
        let root = base.join("docs");
        std::fs::create_dir_all(&root).unwrap();
        FsStore::open(&root, base.join("docs_backup")).unwrap()
    }

    #[test]
    fn scan_walks_tree_and_applies_policy() {
        let tmp = temp_dir();
        let store = make_store(&tmp);
        let root = store.root().to_path_buf();
        write(&root, "a.md", "# A");
        write(&root, "sub/b.txt", "b");
        write(&root, "sub/deeper/c.docx", "");
        write(&root, "_archived/old.md", "old");
        write(&root, ".hidden/secret.md", "secret");
        write(&root, "预算管理-merged.md", "merged");
        write(&root, "image.png", "");

        let docs = store.scan(&ScanPolicy::default()).unwrap();
        let paths: Vec<_> = docs.iter().map(|d| d.relative_path.as_str()).collect();
        assert_eq!(paths, ["a.md", "sub/b.txt", "sub/deeper/c.docx"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn write_is_atomic_and_creates_dirs() {
        let tmp = temp_dir();
        let store = make_store(&tmp);

        store.write_text("nested/out-merged.md", "hello").unwrap();
        let written = std::fs::read_to_string(store.root().join("nested/out-merged.md")).unwrap();
        assert_eq!(written, "hello");

        for entry in std::fs::read_dir(store.root().join("nested")).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn remove_deletes_file() {
        let tmp = temp_dir();
        let store = make_store(&tmp);
        write(store.root(), "x.md", "x");

        assert!(store.exists("x.md"));
        store.remove("x.md").unwrap();
        assert!(!store.exists("x.md"));
        assert!(!store.root().join("x.md").exists());
        assert!(store.remove("x.md").is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn paths_escaping_root_are_rejected() {
        let tmp = temp_dir();
        let store = make_store(&tmp);

        assert!(store.write_text("../escape.md", "x").is_err());
        assert!(store.remove("/etc/passwd").is_err());
        assert!(store.read_bytes("../docs_backup/x.md").is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn backup_copies_full_tree_and_replaces_previous() {
        let tmp = temp_dir();
        let store = make_store(&tmp);
        write(store.root(), "a.md", "alpha");
        write(store.root(), "_archived/old.md", "old");
        write(store.root(), "sub/b.txt", "beta");

        let stale = store.backup_dir().join("stale.md");
        std::fs::create_dir_all(store.backup_dir()).unwrap();
        std::fs::write(&stale, "stale").unwrap();

        let dest = store.backup().unwrap();
        assert_eq!(std::fs::read_to_string(dest.join("a.md")).unwrap(), "alpha");
        assert_eq!(std::fs::read_to_string(dest.join("sub/b.txt")).unwrap(), "beta");
        assert!(dest.join("_archived/old.md").exists());
        assert!(!stale.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn backup_inside_root_is_rejected() {
        let tmp = temp_dir();
        let root = tmp.join("docs");
        std::fs::create_dir_all(&root).unwrap();

        let err = FsStore::open(&root, root.join("_backup")).unwrap_err();
        assert!(err.to_string().contains("outside the document root"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn backup_containing_root_is_rejected() {
        let tmp = temp_dir();
        let root = tmp.join("work/docs");
        write(&root, "a.md", "alpha");

        let err = FsStore::open(&root, tmp.join("work")).unwrap_err();
        assert!(err.to_string().contains("must not contain the document root"));
        assert!(FsStore::open(&root, &tmp).is_err());
        assert!(FsStore::open(&root, root.join("..")).is_err());
        assert!(root.join("a.md").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn default_backup_dir_is_sibling() {
        let dir = FsStore::default_backup_dir(Path::new("/work/docs"), "_backup");
        assert_eq!(dir, PathBuf::from("/work/docs_backup"));
    }

    #[test]
    fn open_rejects_missing_root() {
        let tmp = temp_dir();
        let err = FsStore::open(tmp.join("nope"), tmp.join("bk")).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
