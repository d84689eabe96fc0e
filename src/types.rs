//! Core record types exchanged with the pipeline host.
//!
//! A [`Record`] carries an opaque [`Position`], an [`Operation`], string metadata, an optional key,
//! and a [`Change`] holding the payload before and after the change. The processor only reads the
//! position and `payload.after`; everything else travels through untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a record in its source (used for tracing and failure attribution only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Position(pub Vec<u8>);

impl Position {
    /// Create a position from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw position bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for Position {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for Position {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

/// Kind of change a record describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Operation {
    /// A new entity was created.
    #[default]
    Create,
    /// An existing entity was updated.
    Update,
    /// An entity was deleted.
    Delete,
    /// A point-in-time snapshot of an entity.
    Snapshot,
}

/// A single value inside [`StructuredData`].
///
/// Numbers keep the width they arrived with so that maps survive a trip through the canonical
/// JSON tree unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt64(u64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string.
    Utf8(String),
    /// Ordered list of values.
    List(Vec<FieldValue>),
    /// Nested map.
    Map(StructuredData),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Utf8(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Utf8(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float64(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<StructuredData> for FieldValue {
    fn from(value: StructuredData) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        Self::List(value)
    }
}

/// Already-parsed payload: a mapping from field name to [`FieldValue`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredData(pub BTreeMap<String, FieldValue>);

impl StructuredData {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning `self` for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a top-level field.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for StructuredData {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Undecoded payload bytes, expected to hold JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawData(pub Vec<u8>);

impl RawData {
    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for RawData {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for RawData {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

/// Record data in one of the two representations the host supports.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Pre-parsed map.
    Structured(StructuredData),
    /// Encoded bytes.
    Raw(RawData),
}

impl Payload {
    /// Convenience constructor for a raw payload.
    pub fn raw(bytes: impl Into<RawData>) -> Self {
        Self::Raw(bytes.into())
    }

    /// Returns the structured map if this is a structured payload.
    pub fn as_structured(&self) -> Option<&StructuredData> {
        match self {
            Self::Structured(data) => Some(data),
            Self::Raw(_) => None,
        }
    }

    /// Returns the raw bytes if this is a raw payload.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            Self::Raw(data) => Some(data.as_bytes()),
            Self::Structured(_) => None,
        }
    }
}

/// Payload before and after the change the record describes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Change {
    /// State before the change (may be absent).
    pub before: Option<Payload>,
    /// State after the change. This is the payload the processor transforms.
    pub after: Option<Payload>,
}

/// A record flowing through the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// Source position.
    pub position: Position,
    /// Change kind.
    pub operation: Operation,
    /// Free-form string metadata.
    pub metadata: BTreeMap<String, String>,
    /// Optional record key.
    pub key: Option<Payload>,
    /// Payload change.
    pub payload: Change,
}

impl Record {
    /// Create a record whose `payload.after` is `after`.
    pub fn new(position: impl Into<Position>, after: Payload) -> Self {
        Self {
            position: position.into(),
            payload: Change {
                before: None,
                after: Some(after),
            },
            ..Default::default()
        }
    }

    /// The payload the processor operates on, if any.
    pub fn after(&self) -> Option<&Payload> {
        self.payload.after.as_ref()
    }
}

/// A record emitted by the processor. Failed records are never represented; they are dropped.
pub type ProcessedRecord = Record;
