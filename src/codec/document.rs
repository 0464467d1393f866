// src/codec/document.rs

use std::fmt;

use crate::errors::{DatahookError, Result};

/// Decoded payload of a data file.
///
/// The bytes are opaque to the codec. The cooperating application writes
/// JSON, so [`Document::to_json`] is offered as a convenience.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Document(Vec<u8>);

impl Document {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| DatahookError::InvalidPayload(format!("encoding JSON: {e}")))?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interpret the payload as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.0)
            .map_err(|e| DatahookError::InvalidPayload(format!("payload is not JSON: {e}")))
    }

    /// blake3 digest of the payload, used to suppress re-delivery of
    /// unchanged documents.
    pub fn digest(&self) -> blake3::Hash {
        blake3::hash(&self.0)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Document")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

impl From<Vec<u8>> for Document {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Document {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
