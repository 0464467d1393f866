// src/watch/tracker.rs

//! Change detection state owned by the poll loop.
//!
//! Pure and synchronous: the loop feeds it stat results and decoded
//! documents, and it answers whether something changed and whether a
//! document should be delivered. No IO, no Tokio.

use std::time::SystemTime;

use crate::codec::Document;

/// Result of comparing a fresh stat against the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The file does not exist (yet).
    Missing,
    /// The file exists and its modification time has not advanced.
    Unchanged,
    /// The modification time is strictly newer than the baseline.
    Changed(SystemTime),
}

#[derive(Debug, Default)]
pub struct ChangeTracker {
    baseline: Option<SystemTime>,
    last_delivered: Option<blake3::Hash>,
    suppress_unchanged: bool,
}

impl ChangeTracker {
    pub fn new(suppress_unchanged: bool) -> Self {
        Self {
            baseline: None,
            last_delivered: None,
            suppress_unchanged,
        }
    }

    pub fn baseline(&self) -> Option<SystemTime> {
        self.baseline
    }

    pub fn observe(&self, modified: Option<SystemTime>) -> Observation {
        match (modified, self.baseline) {
            (None, _) => Observation::Missing,
            (Some(now), Some(seen)) if now <= seen => Observation::Unchanged,
            (Some(now), _) => Observation::Changed(now),
        }
    }

    /// Record `modified` as consumed. The baseline never moves backwards.
    pub fn advance(&mut self, modified: SystemTime) {
        if self.baseline.is_none_or(|seen| modified > seen) {
            self.baseline = Some(modified);
        }
    }

    /// Whether `doc` should go to the consumer. Remembers its digest when it
    /// does.
    pub fn should_deliver(&mut self, doc: &Document) -> bool {
        let digest = doc.digest();
        if self.suppress_unchanged && self.last_delivered == Some(digest) {
            return false;
        }
        self.last_delivered = Some(digest);
        true
    }

    /// Forget the last delivered document, e.g. after an error event, so
    /// the same content is delivered again once it decodes.
    pub fn forget_delivered(&mut self) {
        self.last_delivered = None;
    }
}
