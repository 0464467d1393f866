// src/watch/mod.rs

//! Data file change watching.
//!
//! This module is responsible for:
//! - Resolving the data file path once, before watching starts.
//! - Polling the file's modification time from a background task.
//! - Reading changed content with bounded retries while the external
//!   application may still be writing.
//! - Decoding it with the codec and delivering one event per change.
//! - Writing outgoing documents under the same IO lock as the poll loop.
//!
//! It does **not** interpret decoded documents; consumers do.

use std::time::Duration;

use crate::codec::DataFileCodec;

pub mod resolver;
pub mod retry;
pub mod state;
pub mod tracker;
pub mod watcher;

pub use resolver::{InstallDirResolver, PathResolver, StaticPath, resolver_for_target};
pub use state::WatchState;
pub use tracker::{ChangeTracker, Observation};
pub use watcher::{CloseHandle, WatchEvent, Watcher, WriteHandle};

/// Timing, retry and codec settings for a [`Watcher`].
#[derive(Debug, Clone, Copy)]
pub struct WatchOptions {
    /// Poll delay while the file does not exist.
    pub missing_interval: Duration,
    /// Poll delay while the file exists and is unchanged.
    pub present_interval: Duration,
    /// Extra read attempts after a transient failure.
    pub read_retries: u32,
    /// First retry delay, doubled per attempt.
    pub read_backoff: Duration,
    /// Deliver a file that already exists when watching starts.
    pub deliver_initial: bool,
    /// Skip documents identical to the last one delivered.
    pub suppress_unchanged: bool,
    pub codec: DataFileCodec,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            missing_interval: Duration::from_millis(2000),
            present_interval: Duration::from_micros(500),
            read_retries: 5,
            read_backoff: Duration::from_micros(4),
            deliver_initial: true,
            suppress_unchanged: true,
            codec: DataFileCodec::default(),
        }
    }
}
