// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
struct MockFile {
    content: Vec<u8>,
    modified: SystemTime,
}

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, MockFile>,
    dirs: HashSet<PathBuf>,
    /// Number of upcoming reads that fail with a transient error.
    failing_reads: u32,
    reads: u32,
    writes: u32,
    clock: u64,
}

/// In-memory filesystem with a manual clock.
///
/// Every mutation advances the clock by one second, so each write produces
/// a strictly newer modification time regardless of host timer resolution.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(state: &mut MockState) -> SystemTime {
        state.clock += 1;
        SystemTime::UNIX_EPOCH + Duration::from_secs(state.clock)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        let modified = Self::tick(&mut state);
        state.files.insert(
            path.as_ref().to_path_buf(),
            MockFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Overwrite the content while keeping the previous modification time.
    pub fn replace_silently(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        if let Some(file) = state.files.get_mut(path.as_ref()) {
            file.content = content.into();
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.lock().dirs.insert(path.as_ref().to_path_buf());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.lock().files.remove(path.as_ref());
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.lock().files.get(path.as_ref()).map(|f| f.content.clone())
    }

    /// Make the next `n` reads fail as if another process held the file.
    pub fn fail_next_reads(&self, n: u32) {
        self.lock().failing_reads = n;
    }

    pub fn read_count(&self) -> u32 {
        self.lock().reads
    }

    pub fn write_count(&self) -> u32 {
        self.lock().writes
    }
}

impl FileSystem for MockFileSystem {
    fn modified(&self, path: &Path) -> io::Result<Option<SystemTime>> {
        Ok(self.lock().files.get(path).map(|f| f.modified))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut state = self.lock();
        state.reads += 1;
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "file is being used by another process",
            ));
        }
        match state.files.get(path) {
            Some(file) => Ok(file.content.clone()),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("File not found: {:?}", path),
            )),
        }
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !state.dirs.contains(parent) {
                return Err(anyhow!("Not a directory or not found: {:?}", parent));
            }
        }
        let modified = Self::tick(&mut state);
        state.writes += 1;
        state.files.insert(
            path.to_path_buf(),
            MockFile {
                content: contents.to_vec(),
                modified,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock().dirs.contains(path)
    }
}
