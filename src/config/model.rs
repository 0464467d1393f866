// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::codec::{DEFAULT_CHUNK_SIZE, DataFileCodec};
use crate::watch::WatchOptions;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [target]
/// install_dir = "C:/Games/Counter-Strike Global Offensive"
/// datafile = "bridge.dat"
///
/// [poll]
/// missing_interval_ms = 2000
/// present_interval_us = 500
///
/// [read]
/// retries = 5
/// backoff_us = 4
///
/// [codec]
/// chunk_size = 250
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub target: TargetSection,

    #[serde(default)]
    pub poll: PollSection,

    #[serde(default)]
    pub read: ReadSection,

    #[serde(default)]
    pub codec: CodecSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub target: TargetSection,
    pub poll: PollSection,
    pub read: ReadSection,
    pub codec: CodecSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            target: raw.target,
            poll: raw.poll,
            read: raw.read,
            codec: raw.codec,
        }
    }

    /// Watcher timing and retry options derived from `[poll]` and `[read]`.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            missing_interval: Duration::from_millis(self.poll.missing_interval_ms),
            present_interval: Duration::from_micros(self.poll.present_interval_us),
            read_retries: self.read.retries,
            read_backoff: Duration::from_micros(self.read.backoff_us),
            deliver_initial: self.poll.deliver_initial,
            suppress_unchanged: self.poll.suppress_unchanged,
            codec: self.codec(),
        }
    }

    pub fn codec(&self) -> DataFileCodec {
        DataFileCodec::with_chunk_size(self.codec.chunk_size)
    }
}

/// `[target]` section: where the data file lives.
///
/// Either a direct `path`, or an installation directory plus file name that
/// is joined as `<install_dir>/<scripts_subdir>/<datafile>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub install_dir: Option<PathBuf>,

    #[serde(default)]
    pub datafile: Option<String>,

    #[serde(default = "default_scripts_subdir")]
    pub scripts_subdir: PathBuf,
}

fn default_scripts_subdir() -> PathBuf {
    PathBuf::from("ot").join("scripts")
}

impl Default for TargetSection {
    fn default() -> Self {
        Self {
            path: None,
            install_dir: None,
            datafile: None,
            scripts_subdir: default_scripts_subdir(),
        }
    }
}

/// `[poll]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollSection {
    /// Delay between checks while the file does not exist.
    #[serde(default = "default_missing_interval_ms")]
    pub missing_interval_ms: u64,

    /// Delay between checks while the file exists but is unchanged.
    #[serde(default = "default_present_interval_us")]
    pub present_interval_us: u64,

    /// Whether a file that already exists at start is delivered as the
    /// first change.
    #[serde(default = "default_true")]
    pub deliver_initial: bool,

    /// Skip documents identical to the previously delivered one.
    #[serde(default = "default_true")]
    pub suppress_unchanged: bool,
}

fn default_missing_interval_ms() -> u64 {
    2000
}

fn default_present_interval_us() -> u64 {
    500
}

fn default_true() -> bool {
    true
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            missing_interval_ms: default_missing_interval_ms(),
            present_interval_us: default_present_interval_us(),
            deliver_initial: true,
            suppress_unchanged: true,
        }
    }
}

/// `[read]` section: retries while the external writer holds the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadSection {
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// First backoff delay; doubled after every failed attempt.
    #[serde(default = "default_backoff_us")]
    pub backoff_us: u64,
}

fn default_retries() -> u32 {
    5
}

fn default_backoff_us() -> u64 {
    4
}

impl Default for ReadSection {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            backoff_us: default_backoff_us(),
        }
    }
}

/// `[codec]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecSection {
    /// Maximum base64 characters per chunk line.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for CodecSection {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}
