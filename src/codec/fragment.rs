// src/codec/fragment.rs

//! Fallback decoder for data files that carry chunks as embedded JSON.
//!
//! Some deployed files have no usable `meta` line. Instead the hex-decoded
//! content holds small objects like `{"id":"out-3","v":"<chunk>"}` scattered
//! through otherwise binary data. We scan the whole decoded buffer for JSON
//! fragments, keep those with the `id`/`v` shape and reassemble them by
//! index.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::bytes::Regex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::codec::meta::META_KEY;
use crate::errors::{DatahookError, Result};
use crate::types::Direction;

/// Matches a bracketed run of JSON-ish bytes: literals, numbers, punctuation
/// and quoted strings.
static JSON_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?-u)[{\[]([,:{}\[\]0-9.\-+Eaeflnr-u \n\r\t]|".*?")+[}\]]"#)
        .unwrap_or_else(|e| panic!("JSON fragment pattern must compile: {e}"))
});

/// Collect `out-<i>` chunk values found anywhere in `file`.
///
/// Returns `None` when the buffer is not hex at all or when no usable
/// fragment is found, so the caller can report its own primary error.
pub fn scan_chunks(file: &[u8]) -> Option<BTreeMap<usize, String>> {
    let hex_text: Vec<u8> = file
        .iter()
        .copied()
        .filter(|b| *b != b'\n' && *b != b'\r')
        .collect();
    let decoded = match hex::decode(&hex_text) {
        Ok(decoded) => decoded,
        Err(e) => {
            debug!("fragment scan skipped: buffer is not hex ({e})");
            return None;
        }
    };

    let prefix = Direction::Outbound.chunk_prefix();
    let mut chunks = BTreeMap::new();

    // Adjacent objects fall into one match; the stream deserializer splits
    // them and stops at the first byte that is not JSON.
    let objects = JSON_FRAGMENT.find_iter(&decoded).flat_map(|m| {
        serde_json::Deserializer::from_slice(m.as_bytes())
            .into_iter::<Value>()
            .map_while(|v| v.ok())
    });

    for value in objects {
        let Value::Object(obj) = value else {
            continue;
        };
        if obj.contains_key(META_KEY) {
            continue;
        }
        let (Some(id), Some(v)) = (
            obj.get("id").and_then(Value::as_str),
            obj.get("v").and_then(Value::as_str),
        ) else {
            continue;
        };
        let Some(index) = id
            .strip_prefix(prefix)
            .and_then(|suffix| suffix.parse::<usize>().ok())
        else {
            trace!(id, "discarding fragment without usable index");
            continue;
        };
        chunks.insert(index, v.to_string());
    }

    if chunks.is_empty() {
        None
    } else {
        debug!(count = chunks.len(), "fragment scan recovered chunks");
        Some(chunks)
    }
}

/// Join chunks `0..n` in index order, failing on the first gap.
pub fn reassemble(chunks: &BTreeMap<usize, String>) -> Result<String> {
    let mut joined = String::new();
    for (expected, (&index, value)) in chunks.iter().enumerate() {
        if index != expected {
            return Err(DatahookError::MissingChunk { index: expected });
        }
        joined.push_str(value);
    }
    Ok(joined)
}
