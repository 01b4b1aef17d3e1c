use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::CheckpointError;

/// Append-only set of fingerprints of videos whose transcript has been
/// persisted. Read fully into memory on open.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    done: HashSet<String>,
    file: File,
}

impl CheckpointStore {
    pub fn open(path: &Path) -> Result<Self, CheckpointError> {
        let io_err = |source| CheckpointError {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let done: HashSet<String> = if path.exists() {
            std::fs::read_to_string(path)
                .map_err(io_err)?
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            HashSet::new()
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;

        Ok(Self {
            path: path.to_path_buf(),
            done,
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }

    pub fn is_done(&self, fingerprint: &str) -> bool {
        self.done.contains(fingerprint)
    }

    /// Durably append `fingerprint`. Call only after the transcript has been
    /// persisted.
    pub fn mark_done(&mut self, fingerprint: &str) -> Result<(), CheckpointError> {
        if self.done.contains(fingerprint) {
            return Ok(());
        }
        let io_err = |source| CheckpointError {
            path: self.path.clone(),
            source,
        };
        writeln!(self.file, "{}", fingerprint).map_err(io_err)?;
        self.file.flush().map_err(io_err)?;
        self.file.sync_data().map_err(io_err)?;
        self.done.insert(fingerprint.to_string());
        Ok(())
    }
}

/// Number of fingerprints recorded in a checkpoint file, without opening it
/// for writing.
pub fn count_done(path: &Path) -> std::io::Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let content = std::fs::read_to_string(path)?;
    let unique: HashSet<&str> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    Ok(unique.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store_from_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let store = CheckpointStore::open(&tmp.path().join("nested").join("done.txt")).unwrap();
        assert!(store.is_empty());
        assert!(!store.is_done("abc"));
    }

    #[test]
    fn test_mark_done_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("done.txt");

        let mut store = CheckpointStore::open(&path).unwrap();
        store.mark_done("aaa").unwrap();
        store.mark_done("bbb").unwrap();
        assert!(store.is_done("aaa"));
        drop(store);

        let store = CheckpointStore::open(&path).unwrap();
        assert!(store.is_done("aaa"));
        assert!(store.is_done("bbb"));
        assert!(!store.is_done("ccc"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_file_is_append_only_lines() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("done.txt");
        std::fs::write(&path, "old1\n\nold2\n").unwrap();

        let mut store = CheckpointStore::open(&path).unwrap();
        store.mark_done("new1").unwrap();
        store.mark_done("old1").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "old1\n\nold2\nnew1\n");
        assert_eq!(count_done(&path).unwrap(), 3);
    }

    #[test]
    fn test_count_done_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(count_done(&tmp.path().join("missing.txt")).unwrap(), 0);
    }
}
