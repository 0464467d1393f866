// src/codec/meta.rs

use serde_json::{Map, Value};

use crate::codec::keyset::KeySet;
use crate::errors::{DatahookError, Result};
use crate::types::Direction;

/// Logical key name of the meta descriptor.
pub const META_KEY: &str = "meta";

/// The JSON object stored under `meta`.
///
/// Only the chunk counts are interpreted; every other field is carried
/// through untouched, in its original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetaDescriptor {
    fields: Map<String, Value>,
}

impl MetaDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the descriptor out of a key set.
    ///
    /// `Ok(None)` when no `meta` line exists, `InvalidMeta` when it exists but
    /// is not a JSON object.
    pub fn load(keys: &KeySet) -> Result<Option<Self>> {
        if !keys.contains(META_KEY) {
            return Ok(None);
        }
        let raw = keys.get(META_KEY)?;
        Self::from_json_str(&raw).map(Some)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            Ok(other) => Err(DatahookError::InvalidMeta(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(DatahookError::InvalidMeta(format!("not valid JSON: {e}"))),
        }
    }

    /// Chunk count for `direction`, which must be present and a
    /// non-negative integer.
    pub fn chunk_count(&self, direction: Direction) -> Result<usize> {
        let field = direction.max_field();
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| DatahookError::InvalidMeta(format!("`{field}` is missing")))?;
        as_count(value).ok_or_else(|| {
            DatahookError::InvalidMeta(format!(
                "`{field}` must be a non-negative integer, got {value}"
            ))
        })
    }

    /// Like [`chunk_count`](Self::chunk_count) but `None` when absent or
    /// unusable.
    pub fn try_chunk_count(&self, direction: Direction) -> Option<usize> {
        self.fields.get(direction.max_field()).and_then(as_count)
    }

    pub fn set_chunk_count(&mut self, direction: Direction, count: usize) {
        self.fields
            .insert(direction.max_field().to_string(), Value::from(count));
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn to_json_string(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

fn as_count(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    // The external application writes numbers through a float-only runtime.
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= usize::MAX as f64 => Some(f as usize),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
