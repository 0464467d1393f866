// src/watch/resolver.rs

//! Locating the data file before a watcher starts.
//!
//! Resolution runs once, before the watcher is constructed. A failure here
//! is fatal to construction and surfaces as `PathResolution`.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::TargetSection;
use crate::errors::{DatahookError, Result};
use crate::fs::FileSystem;

/// Something that can produce the absolute path of the data file.
pub trait PathResolver {
    fn resolve(&self) -> Result<PathBuf>;
}

/// A path that is already known.
#[derive(Debug, Clone)]
pub struct StaticPath(pub PathBuf);

impl PathResolver for StaticPath {
    fn resolve(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// `<install_dir>/<scripts_subdir>/<datafile>`, where `install_dir` must
/// exist.
#[derive(Debug)]
pub struct InstallDirResolver<'a> {
    fs: &'a dyn FileSystem,
    install_dir: PathBuf,
    scripts_subdir: PathBuf,
    datafile: String,
}

impl<'a> InstallDirResolver<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        install_dir: impl Into<PathBuf>,
        scripts_subdir: impl Into<PathBuf>,
        datafile: impl Into<String>,
    ) -> Self {
        Self {
            fs,
            install_dir: install_dir.into(),
            scripts_subdir: scripts_subdir.into(),
            datafile: datafile.into(),
        }
    }
}

impl PathResolver for InstallDirResolver<'_> {
    fn resolve(&self) -> Result<PathBuf> {
        if !self.fs.is_dir(&self.install_dir) {
            return Err(DatahookError::PathResolution(format!(
                "installation directory {:?} does not exist",
                self.install_dir
            )));
        }
        let path = self
            .install_dir
            .join(&self.scripts_subdir)
            .join(&self.datafile);
        debug!(?path, "resolved data file from installation directory");
        Ok(path)
    }
}

/// Pick a resolver for the `[target]` section, with `path_override` (the
/// `--path` flag) taking precedence.
pub fn resolver_for_target<'a>(
    fs: &'a dyn FileSystem,
    target: &TargetSection,
    path_override: Option<&Path>,
) -> Result<Box<dyn PathResolver + 'a>> {
    if let Some(path) = path_override.or(target.path.as_deref()) {
        return Ok(Box::new(StaticPath(path.to_path_buf())));
    }
    match (&target.install_dir, &target.datafile) {
        (Some(dir), Some(name)) => Ok(Box::new(InstallDirResolver::new(
            fs,
            dir.clone(),
            target.scripts_subdir.clone(),
            name.clone(),
        ))),
        _ => Err(DatahookError::PathResolution(
            "no data file configured: pass --path or set [target] in the config".to_string(),
        )),
    }
}
