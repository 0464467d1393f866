// src/codec/keyset.rs

use tracing::trace;

use crate::codec::key::{HASH_LEN, decode_line, encode_line, hash_name};
use crate::errors::{DatahookError, Result};

/// The lines of one data file, in file order.
///
/// Lines are kept verbatim so keys we never touch are written back exactly as
/// the external application left them. Validation happens lazily when a
/// line is looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet {
    lines: Vec<String>,
}

impl KeySet {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Split raw file bytes into lines. Blank lines are dropped and a
    /// trailing `\r` is tolerated.
    pub fn parse(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        let lines = text
            .split('\n')
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Index of the first line whose hash prefix matches `name`.
    pub fn find_by_name(&self, name: &str) -> Result<usize> {
        let hash = hash_name(name);
        self.lines
            .iter()
            .position(|line| {
                line.get(..HASH_LEN)
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&hash))
            })
            .ok_or_else(|| DatahookError::KeyNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find_by_name(name).is_ok()
    }

    /// Decoded value stored under `name`.
    pub fn get(&self, name: &str) -> Result<String> {
        let index = self.find_by_name(name)?;
        decode_line(&self.lines[index])?.value()
    }

    /// Replace the value of `name` in place, or append it as a new line.
    pub fn set(&mut self, name: &str, raw_value: &str) {
        let line = encode_line(name, raw_value);
        match self.find_by_name(name) {
            Ok(index) => {
                trace!(key = name, index, "replacing key line");
                self.lines[index] = line;
            }
            Err(_) => {
                trace!(key = name, "appending key line");
                self.lines.push(line);
            }
        }
    }

    /// Remove the first line stored under `name`. Returns whether a line was
    /// removed.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.find_by_name(name) {
            Ok(index) => {
                self.lines.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// One line per entry, each terminated by `\n`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out.into_bytes()
    }
}
