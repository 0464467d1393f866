// src/codec/key.rs

//! Single-line key encoding.
//!
//! Every line of a data file is `HHHHHHHH` + `payload`, where `HHHHHHHH` is
//! the uppercase 32-bit FNV-1a digest of the logical key name and `payload`
//! is the hex-encoded value.
//!
//! Lookup is by hash prefix only. Two names with the same digest are
//! indistinguishable and the first line in file order wins; this is a
//! property of the external format and cannot be widened without breaking
//! compatibility.

use crate::errors::{DatahookError, Result};

/// Width of the hash prefix in characters.
pub const HASH_LEN: usize = 8;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over raw bytes.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash prefix for a logical key name: 8 uppercase hex characters.
pub fn hash_name(name: &str) -> String {
    format!("{:08X}", fnv1a_32(name.as_bytes()))
}

/// Encode a full line for `name` holding `raw_value`.
///
/// Newlines are stripped from the value before encoding so the payload can
/// never split a line.
pub fn encode_line(name: &str, raw_value: &str) -> String {
    let value = raw_value.replace('\n', "");
    let mut line = hash_name(name);
    line.push_str(&hex::encode(value.as_bytes()));
    line
}

/// A decoded line: hash prefix plus still hex-encoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLine {
    pub hash: String,
    pub payload: String,
}

impl KeyLine {
    /// Hex-decode the payload into the raw value.
    pub fn value(&self) -> Result<String> {
        decode_payload(&self.payload)
    }
}

/// Split a line into hash prefix and hex payload.
pub fn decode_line(line: &str) -> Result<KeyLine> {
    let line = line.trim_end_matches('\r');
    let (hash, payload) = match (line.get(..HASH_LEN), line.get(HASH_LEN..)) {
        (Some(hash), Some(payload)) => (hash, payload),
        _ => {
            return Err(DatahookError::MalformedLine(format!(
                "line shorter than {HASH_LEN} characters: {line:?}"
            )));
        }
    };

    if payload.len() % 2 != 0 || !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DatahookError::MalformedLine(format!(
            "payload of key {hash} is not valid hex"
        )));
    }

    Ok(KeyLine {
        hash: hash.to_string(),
        payload: payload.to_string(),
    })
}

/// Hex-decode a payload, ignoring embedded newlines.
pub fn decode_payload(payload: &str) -> Result<String> {
    let cleaned: String = payload.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let bytes = hex::decode(&cleaned)
        .map_err(|e| DatahookError::MalformedLine(format!("invalid hex payload: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| DatahookError::MalformedLine(format!("payload is not UTF-8: {e}")))
}
