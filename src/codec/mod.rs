// src/codec/mod.rs

//! Data file codec.
//!
//! - [`key`] encodes and decodes single `hash + hex` lines.
//! - [`keyset`] holds a whole file as an ordered set of lines.
//! - [`meta`] reads and updates the `meta` descriptor.
//! - [`fragment`] is the fallback decoder for files carrying `{"id","v"}`
//!   fragments instead of a `meta` line.
//! - [`document`] is the decoded payload handed to consumers.
//!
//! [`DataFileCodec`] composes these into whole-file `parse` and `serialize`.

pub mod document;
pub mod fragment;
pub mod key;
pub mod keyset;
pub mod meta;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use tracing::debug;

use crate::errors::{DatahookError, Result};
use crate::types::Direction;

pub use document::Document;
pub use key::{KeyLine, decode_line, encode_line, hash_name};
pub use keyset::KeySet;
pub use meta::{META_KEY, MetaDescriptor};

/// Canonical maximum chunk length in base64 characters.
pub const DEFAULT_CHUNK_SIZE: usize = 250;

/// Whole-file encoder/decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFileCodec {
    chunk_size: usize,
}

impl Default for DataFileCodec {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DataFileCodec {
    /// Codec with a custom chunk size. A size of zero falls back to the
    /// default.
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        let chunk_size = if chunk_size == 0 {
            DEFAULT_CHUNK_SIZE
        } else {
            chunk_size
        };
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Decode the document the external application wrote (`out-*`).
    pub fn parse(&self, file: &[u8]) -> Result<Document> {
        self.parse_as(file, Direction::Outbound)
    }

    /// Decode the chunk sequence of `direction`.
    ///
    /// The line-oriented layout is tried first. Only when no `meta` line
    /// exists do we fall back to scanning for embedded JSON fragments
    /// (outbound only).
    pub fn parse_as(&self, file: &[u8], direction: Direction) -> Result<Document> {
        let keys = KeySet::parse(file);
        match parse_lines(&keys, direction) {
            Err(DatahookError::MissingMeta) if direction == Direction::Outbound => {
                debug!("no meta line; trying fragment scan");
                let chunks = fragment::scan_chunks(file).ok_or(DatahookError::MissingMeta)?;
                let joined = fragment::reassemble(&chunks)?;
                decode_base64(&joined)
            }
            other => other,
        }
    }

    /// Encode `doc` into the `in-*` half of a data file.
    pub fn serialize(&self, doc: &Document, existing: Option<&[u8]>) -> Result<Vec<u8>> {
        self.serialize_as(doc, existing, Direction::Inbound)
    }

    /// Encode `doc` into the `direction` half of a data file, merging into
    /// `existing` when given.
    ///
    /// Lines outside the written namespace are kept in place. Chunk lines
    /// left over from a previous, longer write are removed. Returns the
    /// whole new file; replacing the file on disk is the caller's job.
    pub fn serialize_as(
        &self,
        doc: &Document,
        existing: Option<&[u8]>,
        direction: Direction,
    ) -> Result<Vec<u8>> {
        let encoded = STANDARD_NO_PAD.encode(doc.as_bytes());
        let chunks = split_chunks(&encoded, self.chunk_size);

        let mut keys = existing.map(KeySet::parse).unwrap_or_default();
        let mut meta = MetaDescriptor::load(&keys)?.unwrap_or_default();

        for (i, chunk) in chunks.iter().enumerate() {
            keys.set(&direction.chunk_key(i), chunk);
        }

        if let Some(old_count) = meta.try_chunk_count(direction) {
            for stale in chunks.len()..old_count {
                keys.remove(&direction.chunk_key(stale));
            }
        }

        meta.set_chunk_count(direction, chunks.len());
        keys.set(META_KEY, &meta.to_json_string());

        debug!(
            %direction,
            bytes = doc.len(),
            chunks = chunks.len(),
            lines = keys.len(),
            "serialized document"
        );
        Ok(keys.to_bytes())
    }
}

fn parse_lines(keys: &KeySet, direction: Direction) -> Result<Document> {
    let meta = MetaDescriptor::load(keys)?.ok_or(DatahookError::MissingMeta)?;
    let count = meta.chunk_count(direction)?;

    let mut joined = String::new();
    for index in 0..count {
        let chunk = match keys.get(&direction.chunk_key(index)) {
            Ok(chunk) => chunk,
            Err(DatahookError::KeyNotFound(_)) => {
                return Err(DatahookError::MissingChunk { index });
            }
            Err(e) => return Err(e),
        };
        joined.push_str(&chunk);
    }

    decode_base64(&joined)
}

fn decode_base64(joined: &str) -> Result<Document> {
    STANDARD_NO_PAD
        .decode(joined.as_bytes())
        .map(Document::new)
        .map_err(|e| DatahookError::InvalidPayload(format!("base64: {e}")))
}

/// Split `encoded` into pieces of at most `size` characters.
///
/// Yields `ceil(len / size)` pieces; no trailing empty piece is produced.
/// `encoded` is base64, so byte boundaries are character boundaries.
pub fn split_chunks(encoded: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    (0..encoded.len())
        .step_by(size)
        .map(|start| &encoded[start..(start + size).min(encoded.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(lines: &[(&str, &str)]) -> Vec<u8> {
        let mut keys = KeySet::new();
        for (name, value) in lines {
            keys.set(name, value);
        }
        keys.to_bytes()
    }

    #[test]
    fn split_chunks_has_no_trailing_empty_piece() {
        let s = "a".repeat(500);
        let chunks = split_chunks(&s, 250);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 250));

        let s = "a".repeat(501);
        let chunks = split_chunks(&s, 250);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].len(), 1);

        assert!(split_chunks("", 250).is_empty());
    }

    #[test]
    fn parses_single_chunk_file() {
        let file = file_with(&[("meta", r#"{"out-max":1}"#), ("out-0", "eyJhIjoxfQ")]);
        let doc = DataFileCodec::default().parse(&file).unwrap();
        assert_eq!(doc.as_bytes(), br#"{"a":1}"#);
    }

    #[test]
    fn zero_chunks_is_empty_document() {
        let file = file_with(&[("meta", r#"{"out-max":0}"#)]);
        let doc = DataFileCodec::default().parse(&file).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn missing_chunk_reports_first_gap() {
        let file = file_with(&[
            ("meta", r#"{"out-max":4}"#),
            ("out-0", "AAAA"),
            ("out-1", "AAAA"),
            ("out-3", "AAAA"),
        ]);
        assert!(matches!(
            DataFileCodec::default().parse(&file),
            Err(DatahookError::MissingChunk { index: 2 })
        ));
    }

    #[test]
    fn missing_meta_is_reported_when_fallback_finds_nothing() {
        let file = file_with(&[("out-0", "eyJhIjoxfQ")]);
        assert!(matches!(
            DataFileCodec::default().parse(&file),
            Err(DatahookError::MissingMeta)
        ));
        assert!(matches!(
            DataFileCodec::default().parse(b""),
            Err(DatahookError::MissingMeta)
        ));
    }

    #[test]
    fn invalid_meta_and_payload_errors() {
        let file = file_with(&[("meta", "[]")]);
        assert!(matches!(
            DataFileCodec::default().parse(&file),
            Err(DatahookError::InvalidMeta(_))
        ));

        let file = file_with(&[("meta", r#"{"in-max":1}"#)]);
        assert!(matches!(
            DataFileCodec::default().parse(&file),
            Err(DatahookError::InvalidMeta(_))
        ));

        let file = file_with(&[("meta", r#"{"out-max":1}"#), ("out-0", "!!not base64!!")]);
        assert!(matches!(
            DataFileCodec::default().parse(&file),
            Err(DatahookError::InvalidPayload(_))
        ));
    }

    #[test]
    fn serialize_into_empty_file_writes_meta_and_chunks() {
        let doc = Document::from(r#"{"a":1}"#);
        let bytes = DataFileCodec::default().serialize(&doc, None).unwrap();
        let keys = KeySet::parse(&bytes);

        assert_eq!(keys.len(), 2);
        assert_eq!(keys.get("in-0").unwrap(), "eyJhIjoxfQ");
        let meta = MetaDescriptor::load(&keys).unwrap().unwrap();
        assert_eq!(meta.chunk_count(Direction::Inbound).unwrap(), 1);
        assert!(meta.get("out-max").is_none());
    }

    #[test]
    fn serialize_merges_with_existing_file() {
        let existing = file_with(&[
            ("meta", r#"{"out-max":1,"in-max":3,"app":"x"}"#),
            ("out-0", "eyJhIjoxfQ"),
            ("in-0", "AAAA"),
            ("in-1", "AAAA"),
            ("in-2", "AAAA"),
        ]);
        let codec = DataFileCodec::with_chunk_size(4);
        let doc = Document::from("hi!");
        let bytes = codec.serialize(&doc, Some(&existing)).unwrap();
        let keys = KeySet::parse(&bytes);

        assert_eq!(keys.get("out-0").unwrap(), "eyJhIjoxfQ");
        assert_eq!(keys.get("in-0").unwrap(), "aGkh");
        assert!(!keys.contains("in-1"));
        assert!(!keys.contains("in-2"));

        let meta = MetaDescriptor::load(&keys).unwrap().unwrap();
        assert_eq!(meta.to_json_string(), r#"{"out-max":1,"in-max":1,"app":"x"}"#);

        // The external side still reads its own document.
        assert_eq!(codec.parse(&bytes).unwrap().as_bytes(), br#"{"a":1}"#);
        assert_eq!(codec.parse_as(&bytes, Direction::Inbound).unwrap(), doc);
    }

    #[test]
    fn falls_back_to_fragment_scan() {
        let mut content = b"\x00\x01".to_vec();
        content.extend_from_slice(br#"{"id":"out-0","v":"eyJhIjox"}"#);
        content.push(0xff);
        content.extend_from_slice(br#"{"id":"out-1","v":"fQ"}"#);
        let file = format!("{}\n", hex::encode(&content));

        let doc = DataFileCodec::default().parse(file.as_bytes()).unwrap();
        assert_eq!(doc.as_bytes(), br#"{"a":1}"#);
    }

    #[test]
    fn inbound_parse_does_not_fall_back() {
        let content = br#"{"id":"out-0","v":"eyJhIjoxfQ"}"#;
        let file = hex::encode(content);
        assert!(matches!(
            DataFileCodec::default().parse_as(file.as_bytes(), Direction::Inbound),
            Err(DatahookError::MissingMeta)
        ));
    }
}
