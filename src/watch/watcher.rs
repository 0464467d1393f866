// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec::{DataFileCodec, Document};
use crate::errors::{DatahookError, Result};
use crate::fs::FileSystem;
use crate::watch::WatchOptions;
use crate::watch::resolver::PathResolver;
use crate::watch::retry::{ReadFailure, read_with_retry};
use crate::watch::state::WatchState;
use crate::watch::tracker::{ChangeTracker, Observation};

/// One delivery: a decoded document, or the error that decoding (or
/// reading) the changed file produced.
pub type WatchEvent = Result<Document>;

/// Modification times shared by the poll loop and the write path. Updated
/// under the IO lock, except for the poll loop's startup baseline.
#[derive(Debug, Default)]
struct WriteMarks {
    /// Last modification time the poll loop consumed.
    baseline: Option<SystemTime>,
    /// Modification time of our last write, when that write replaced a file
    /// the poll loop had already consumed.
    own_write: Option<SystemTime>,
}

type SharedMarks = Arc<Mutex<WriteMarks>>;

fn lock_marks(marks: &SharedMarks) -> std::sync::MutexGuard<'_, WriteMarks> {
    marks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Watches one data file and delivers a decoded document per change.
///
/// A background task polls the file's modification time. Deliveries go
/// through a single-slot channel, so the task waits until the consumer
/// calls [`Watcher::next`] before looking for the next change.
///
/// Dropping the watcher closes it.
pub struct Watcher {
    path: PathBuf,
    events: mpsc::Receiver<WatchEvent>,
    closer: CloseHandle,
    closed_rx: watch::Receiver<bool>,
    state_rx: watch::Receiver<WatchState>,
    writer: WriteHandle,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("path", &self.path)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Resolve the data file path and start watching it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open(
        resolver: &dyn PathResolver,
        options: WatchOptions,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self> {
        let path = resolver.resolve().map_err(|e| match e {
            e @ DatahookError::PathResolution(_) => e,
            other => DatahookError::PathResolution(other.to_string()),
        })?;
        Ok(Self::spawn(path, options, fs))
    }

    /// Start watching an already resolved path.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>, options: WatchOptions, fs: Arc<dyn FileSystem>) -> Self {
        let path = path.into();

        let (event_tx, event_rx) = mpsc::channel::<WatchEvent>(1);
        let (closed_tx, closed_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(WatchState::Idle);
        let io_lock = Arc::new(tokio::sync::Mutex::new(()));
        let marks: SharedMarks = Arc::new(Mutex::new(WriteMarks::default()));

        let writer = WriteHandle {
            path: path.clone(),
            fs: Arc::clone(&fs),
            codec: options.codec,
            read_retries: options.read_retries,
            read_backoff: options.read_backoff,
            io_lock: Arc::clone(&io_lock),
            marks: Arc::clone(&marks),
            closed_rx: closed_rx.clone(),
        };

        let poll = PollLoop {
            path: path.clone(),
            fs,
            tracker: ChangeTracker::new(options.suppress_unchanged),
            options,
            io_lock,
            marks,
            events: event_tx,
            closed_rx: closed_rx.clone(),
            state_tx,
        };

        info!(?path, "data file watcher started");
        let task = tokio::spawn(poll.run());

        Self {
            path,
            events: event_rx,
            closer: CloseHandle {
                tx: Arc::new(closed_tx),
            },
            closed_rx,
            state_rx,
            writer,
            task: Some(task),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the next change.
    ///
    /// Returns `None` once the watcher is closed, including when
    /// [`close`](Self::close) is called while this call is waiting.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        if *self.closed_rx.borrow() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.closed_rx.wait_for(|closed| *closed) => None,
            event = self.events.recv() => event,
        }
    }

    /// Serialize `doc` into the `in-*` half of the file and replace it.
    pub async fn write(&self, doc: &Document) -> Result<()> {
        self.writer.write(doc).await
    }

    /// A clonable handle for writing while another task awaits `next`.
    pub fn writer(&self) -> WriteHandle {
        self.writer.clone()
    }

    /// Stop watching. Idempotent; pending deliveries are abandoned.
    pub fn close(&self) {
        self.closer.close();
    }

    /// A clonable handle that can close this watcher from anywhere.
    pub fn close_handle(&self) -> CloseHandle {
        self.closer.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closer.is_closed()
    }

    pub fn state(&self) -> WatchState {
        *self.state_rx.borrow()
    }

    /// Close the watcher and wait for its background task to finish.
    pub async fn join(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("watcher task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.closer.close();
    }
}

/// Closes a [`Watcher`]. Cheap to clone; closing twice is a no-op.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CloseHandle {
    pub fn close(&self) {
        if !self.tx.send_replace(true) {
            info!("data file watcher closing");
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Writes documents into the watched file. Shares the watcher's IO lock, so
/// a write never overlaps a read/parse of the same file.
#[derive(Debug, Clone)]
pub struct WriteHandle {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    codec: DataFileCodec,
    read_retries: u32,
    read_backoff: Duration,
    io_lock: Arc<tokio::sync::Mutex<()>>,
    marks: SharedMarks,
    closed_rx: watch::Receiver<bool>,
}

impl WriteHandle {
    pub async fn write(&self, doc: &Document) -> Result<()> {
        if *self.closed_rx.borrow() {
            return Err(DatahookError::WatcherClosed);
        }
        let _guard = self.io_lock.lock().await;
        self.write_locked(doc)
            .await
            .map_err(|source| DatahookError::Write {
                path: self.path.clone(),
                source: Box::new(source),
            })
    }

    async fn write_locked(&self, doc: &Document) -> Result<()> {
        let existing = match read_with_retry(
            self.fs.as_ref(),
            &self.path,
            self.read_retries,
            self.read_backoff,
        )
        .await
        {
            Ok(bytes) => Some(bytes),
            Err(ReadFailure::Vanished) => None,
            Err(ReadFailure::Exhausted(e)) => return Err(e),
        };
        let before = self.fs.modified(&self.path)?;

        let bytes = self.codec.serialize(doc, existing.as_deref())?;
        self.fs.write_atomic(&self.path, &bytes)?;
        let written = self.fs.modified(&self.path)?;

        let mut marks = lock_marks(&self.marks);
        if before == marks.baseline {
            marks.own_write = written;
        } else {
            // The file changed since the poll loop last looked, and that
            // change is now merged into ours. Leave it for the poll loop.
            debug!(path = ?self.path, "write folded in an unconsumed change");
            marks.own_write = None;
        }
        drop(marks);

        info!(path = ?self.path, bytes = doc.len(), "wrote document to data file");
        Ok(())
    }
}

/// State owned by the background task.
struct PollLoop {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    options: WatchOptions,
    tracker: ChangeTracker,
    io_lock: Arc<tokio::sync::Mutex<()>>,
    marks: SharedMarks,
    events: mpsc::Sender<WatchEvent>,
    closed_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<WatchState>,
}

impl PollLoop {
    async fn run(mut self) {
        if !self.options.deliver_initial {
            if let Ok(Some(modified)) = self.fs.modified(&self.path) {
                debug!(?modified, "existing file taken as baseline");
                self.advance(modified);
            }
        }

        loop {
            if *self.closed_rx.borrow() {
                break;
            }
            self.set_state(WatchState::Polling);

            let modified = match self.fs.modified(&self.path) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = ?self.path, error = %e, "stat failed; treating file as missing");
                    None
                }
            };

            let modified = match self.tracker.observe(modified) {
                Observation::Missing => {
                    if !self.pause(self.options.missing_interval).await {
                        break;
                    }
                    continue;
                }
                Observation::Unchanged => {
                    if !self.pause(self.options.present_interval).await {
                        break;
                    }
                    continue;
                }
                Observation::Changed(modified) => modified,
            };

            self.set_state(WatchState::Reading);
            let Some(event) = self.read_and_parse(modified).await else {
                continue;
            };

            let event = match event {
                Ok(doc) if !self.tracker.should_deliver(&doc) => {
                    debug!("document unchanged; not delivering");
                    continue;
                }
                Ok(doc) => Ok(doc),
                Err(e) => {
                    warn!(path = ?self.path, error = %e, "changed data file could not be decoded");
                    // Whatever decodes next is news to the consumer.
                    self.tracker.forget_delivered();
                    Err(e)
                }
            };

            self.set_state(WatchState::Delivering);
            if !self.deliver(event).await {
                break;
            }
        }

        self.set_state(WatchState::Closed);
        debug!(path = ?self.path, "watcher poll loop finished");
    }

    /// Read and decode the file under the IO lock. `None` means there is
    /// nothing to deliver for this change.
    async fn read_and_parse(&mut self, modified: SystemTime) -> Option<WatchEvent> {
        let io_lock = Arc::clone(&self.io_lock);
        let _guard = io_lock.lock().await;

        let own = lock_marks(&self.marks).own_write;
        if own == Some(modified) {
            debug!(?modified, "change is our own write; skipping");
            self.advance(modified);
            return None;
        }

        let read = read_with_retry(
            self.fs.as_ref(),
            &self.path,
            self.options.read_retries,
            self.options.read_backoff,
        )
        .await;

        match read {
            Ok(bytes) => {
                // Baseline moves before parsing so a write landing during the
                // parse shows up on the next poll.
                self.advance(modified);
                debug!(bytes = bytes.len(), "read changed data file");
                Some(self.options.codec.parse(&bytes))
            }
            Err(ReadFailure::Vanished) => None,
            Err(ReadFailure::Exhausted(e)) => {
                self.advance(modified);
                Some(Err(e))
            }
        }
    }

    /// Hand `event` to the consumer. Returns false when the watcher should
    /// stop.
    async fn deliver(&mut self, event: WatchEvent) -> bool {
        tokio::select! {
            biased;
            _ = self.closed_rx.wait_for(|closed| *closed) => {
                debug!("close requested; abandoning pending delivery");
                false
            }
            sent = self.events.send(event) => {
                if sent.is_err() {
                    debug!("consumer dropped; stopping watcher");
                }
                sent.is_ok()
            }
        }
    }

    /// Sleep for `interval` unless closed first. Returns false when closed.
    async fn pause(&mut self, interval: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.closed_rx.wait_for(|closed| *closed) => false,
            _ = tokio::time::sleep(interval) => true,
        }
    }

    /// Move the baseline and share it with the write path.
    fn advance(&mut self, modified: SystemTime) {
        self.tracker.advance(modified);
        lock_marks(&self.marks).baseline = self.tracker.baseline();
    }

    fn set_state(&self, state: WatchState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "watcher state");
        }
    }
}
