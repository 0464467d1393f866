// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Codec errors (`MalformedLine` .. `InvalidPayload`) are what the watcher
//! delivers to the consumer as per-change events; they never stop polling.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatahookError {
    #[error("malformed key line: {0}")]
    MalformedLine(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("data file has no `meta` key")]
    MissingMeta,

    #[error("invalid meta descriptor: {0}")]
    InvalidMeta(String),

    #[error("missing chunk {index}")]
    MissingChunk { index: usize },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("could not resolve data file path: {0}")]
    PathResolution(String),

    #[error("read of {path:?} still failing after {attempts} attempts: {source}")]
    ReadContention {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: Box<DatahookError>,
    },

    #[error("watcher is closed")]
    WatcherClosed,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatahookError {
    /// True for errors produced while decoding a data file.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            DatahookError::MalformedLine(_)
                | DatahookError::KeyNotFound(_)
                | DatahookError::MissingMeta
                | DatahookError::InvalidMeta(_)
                | DatahookError::MissingChunk { .. }
                | DatahookError::InvalidPayload(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DatahookError>;
