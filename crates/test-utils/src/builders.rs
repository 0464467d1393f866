#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use datahook::codec::{KeySet, DataFileCodec, Document};
use datahook::config::{ConfigFile, RawConfigFile};
use datahook::types::Direction;
use datahook::watch::WatchOptions;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.target.path = Some(path.into());
        self
    }

    pub fn with_install_dir(mut self, dir: impl Into<PathBuf>, datafile: &str) -> Self {
        self.config.target.install_dir = Some(dir.into());
        self.config.target.datafile = Some(datafile.to_string());
        self
    }

    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.config.read.retries = retries;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.config.codec.chunk_size = size;
        self
    }

    pub fn with_deliver_initial(mut self, val: bool) -> Self {
        self.config.poll.deliver_initial = val;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Watch options tuned for tests: short intervals so polling reacts within
/// a few milliseconds.
pub fn fast_options() -> WatchOptions {
    WatchOptions {
        missing_interval: Duration::from_millis(5),
        present_interval: Duration::from_micros(200),
        read_retries: 3,
        read_backoff: Duration::from_micros(10),
        ..WatchOptions::default()
    }
}

/// Builds data files the way the external application writes them.
pub struct DataFileBuilder {
    keys: KeySet,
    codec: DataFileCodec,
}

impl DataFileBuilder {
    pub fn new() -> Self {
        Self {
            keys: KeySet::new(),
            codec: DataFileCodec::default(),
        }
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.codec = DataFileCodec::with_chunk_size(size);
        self
    }

    /// Raw `name = value` line.
    pub fn key(mut self, name: &str, value: &str) -> Self {
        self.keys.set(name, value);
        self
    }

    pub fn meta(self, json: &str) -> Self {
        self.key("meta", json)
    }

    /// Encode `doc` as the outbound (`out-*`) document.
    pub fn outbound(self, doc: impl Into<Document>) -> Self {
        let doc = doc.into();
        let bytes = self
            .codec
            .serialize_as(&doc, Some(&self.keys.to_bytes()), Direction::Outbound)
            .expect("serializing outbound document");
        Self {
            keys: KeySet::parse(&bytes),
            codec: self.codec,
        }
    }

    pub fn build(self) -> Vec<u8> {
        self.keys.to_bytes()
    }
}

impl Default for DataFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
