// src/watch/retry.rs

use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::DatahookError;
use crate::fs::FileSystem;

/// Why a read with retry gave up.
#[derive(Debug)]
pub enum ReadFailure {
    /// The file disappeared; not an error, the poll loop just waits again.
    Vanished,
    /// Every attempt hit a transient error (`ReadContention`).
    Exhausted(DatahookError),
}

/// Read `path`, retrying transient failures with exponential backoff.
///
/// The external application writes the file in place, so a read can collide
/// with an in-progress write. Up to `retries` extra attempts are made,
/// sleeping `backoff`, `2 * backoff`, ... between them.
pub async fn read_with_retry(
    fs: &dyn FileSystem,
    path: &Path,
    retries: u32,
    backoff: Duration,
) -> Result<Vec<u8>, ReadFailure> {
    let attempts = retries.saturating_add(1);
    let mut delay = backoff;
    let mut attempt = 1;

    loop {
        match fs.read(path) {
            Ok(bytes) => {
                if attempt > 1 {
                    debug!(?path, attempt, "read succeeded after retry");
                }
                return Ok(bytes);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(?path, "file vanished before it could be read");
                return Err(ReadFailure::Vanished);
            }
            Err(e) if attempt >= attempts => {
                warn!(?path, attempts, error = %e, "giving up on contended read");
                return Err(ReadFailure::Exhausted(DatahookError::ReadContention {
                    path: path.to_path_buf(),
                    attempts,
                    source: e,
                }));
            }
            Err(e) => {
                debug!(?path, attempt, error = %e, ?delay, "read failed; backing off");
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
        }
    }
}
