// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface used by the watcher.
///
/// Stat and read return raw `io::Result`s because the watcher needs the
/// error kind: `NotFound` means "not yet changed", anything else is treated
/// as contention with the external writer and retried.
pub trait FileSystem: Send + Sync + Debug {
    /// Modification time of `path`, or `None` when it does not exist.
    fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>>;
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
    /// Replace `path` with `contents` so readers see either the old or the
    /// new file, never a partial one.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>> {
        match fs::metadata(path) {
            Ok(meta) => meta.modified().map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let prefix = temp_prefix(path);

        // Unique per call; dropped (and removed) on any error below.
        let mut tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(dir)
            .with_context(|| format!("creating temp file in {:?}", dir))?;
        tmp.write_all(contents)
            .with_context(|| format!("writing to file {:?}", tmp.path()))?;
        tmp.as_file()
            .sync_all()
            .with_context(|| format!("syncing file {:?}", tmp.path()))?;
        tmp.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("renaming temp file to {:?}", path))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// `.<name>.` so temp files sit next to `path` and the rename stays on one
/// filesystem.
fn temp_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "datafile".to_string());
    format!(".{name}.")
}
