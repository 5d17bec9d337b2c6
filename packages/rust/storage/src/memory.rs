//! In-memory [`DocumentStore`] for tests and experiments.
//!
//! Besides holding files, the store can be told to fail specific operations
//! and records every mutation in order, so callers can assert on sequencing
//! (backup before write, removal only after write).

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use docmerge_shared::{DocMergeError, Document, Result};

use crate::{DocumentStore, ScanPolicy};

/// A mutation applied to a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    Backup,
    Write(String),
    Remove(String),
}

#[derive(Debug, Clone)]
struct MemoryFile {
    bytes: Vec<u8>,
    readable: bool,
}

/// Documents held in a map keyed by relative path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: RefCell<BTreeMap<String, MemoryFile>>,
    backup: RefCell<Option<BTreeMap<String, Vec<u8>>>>,
    ops: RefCell<Vec<StoreOp>>,
    fail_backup: bool,
    fail_writes: HashSet<String>,
    fail_removes: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a UTF-8 text file.
    pub fn with_file(self, relative_path: &str, content: &str) -> Self {
        self.with_bytes(relative_path, content.as_bytes().to_vec())
    }

    /// Add a file with arbitrary bytes (e.g. invalid UTF-8).
    pub fn with_bytes(self, relative_path: &str, bytes: Vec<u8>) -> Self {
        self.files.borrow_mut().insert(
            relative_path.to_string(),
            MemoryFile {
                bytes,
                readable: true,
            },
        );
        self
    }

    /// Add a file whose reads fail with a permission error.
    pub fn with_unreadable(self, relative_path: &str) -> Self {
        self.files.borrow_mut().insert(
            relative_path.to_string(),
            MemoryFile {
                bytes: Vec::new(),
                readable: false,
            },
        );
        self
    }

    /// Make every backup attempt fail.
    pub fn failing_backup(mut self) -> Self {
        self.fail_backup = true;
        self
    }

    /// Make writes to `relative_path` fail.
    pub fn failing_write(mut self, relative_path: &str) -> Self {
        self.fail_writes.insert(relative_path.to_string());
        self
    }

    /// Make removal of `relative_path` fail.
    pub fn failing_remove(mut self, relative_path: &str) -> Self {
        self.fail_removes.insert(relative_path.to_string());
        self
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.files.borrow().contains_key(relative_path)
    }

    /// Current content of a file, if present and valid UTF-8.
    pub fn text(&self, relative_path: &str) -> Option<String> {
        self.files
            .borrow()
            .get(relative_path)
            .and_then(|f| String::from_utf8(f.bytes.clone()).ok())
    }

    /// All stored paths in sorted order.
    pub fn paths(&self) -> Vec<String> {
        self.files.borrow().keys().cloned().collect()
    }

    /// Paths captured by the most recent backup.
    pub fn backup_paths(&self) -> Option<Vec<String>> {
        self.backup
            .borrow()
            .as_ref()
            .map(|b| b.keys().cloned().collect())
    }

    /// Every mutation in the order it happened.
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.borrow().clone()
    }
}

impl DocumentStore for MemoryStore {
    fn location(&self) -> String {
        "memory://".to_string()
    }

    fn scan(&self, policy: &ScanPolicy) -> Result<Vec<Document>> {
        // BTreeMap iteration is already ordered by relative path.
        Ok(self
            .files
            .borrow()
            .keys()
            .filter_map(|path| policy.admits_path(path))
            .collect())
    }

    fn exists(&self, relative_path: &str) -> bool {
        self.contains(relative_path)
    }

    fn read_bytes(&self, relative_path: &str) -> std::io::Result<Vec<u8>> {
        match self.files.borrow().get(relative_path) {
            Some(file) if file.readable => Ok(file.bytes.clone()),
            Some(_) => Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("permission denied: {relative_path}"),
            )),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such file: {relative_path}"),
            )),
        }
    }

    fn write_text(&self, relative_path: &str, content: &str) -> Result<()> {
        if self.fail_writes.contains(relative_path) {
            return Err(DocMergeError::io(
                relative_path,
                std::io::Error::other("simulated write failure"),
            ));
        }
        self.files.borrow_mut().insert(
            relative_path.to_string(),
            MemoryFile {
                bytes: content.as_bytes().to_vec(),
                readable: true,
            },
        );
        self.ops
            .borrow_mut()
            .push(StoreOp::Write(relative_path.to_string()));
        Ok(())
    }

    fn remove(&self, relative_path: &str) -> Result<()> {
        if self.fail_removes.contains(relative_path) {
            return Err(DocMergeError::io(
                relative_path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "simulated lock"),
            ));
        }
        if self.files.borrow_mut().remove(relative_path).is_none() {
            return Err(DocMergeError::io(
                relative_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            ));
        }
        self.ops
            .borrow_mut()
            .push(StoreOp::Remove(relative_path.to_string()));
        Ok(())
    }

    fn backup(&self) -> Result<PathBuf> {
        if self.fail_backup {
            return Err(DocMergeError::backup(
                "memory://backup",
                "simulated backup failure",
            ));
        }
        let snapshot = self
            .files
            .borrow()
            .iter()
            .map(|(path, file)| (path.clone(), file.bytes.clone()))
            .collect();
        *self.backup.borrow_mut() = Some(snapshot);
        self.ops.borrow_mut().push(StoreOp::Backup);
        Ok(PathBuf::from("memory://backup"))
    }
}
