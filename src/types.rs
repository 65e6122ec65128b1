//! Common types used throughout recast
//!
//! Shared type aliases and the order-preserving output record type
//! used between the processor and the writer.

use serde_json::Value;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// An input record: string-keyed fields as produced by a reader
pub type Record = serde_json::Map<String, Value>;

// ============================================================================
// Ordered Output Record
// ============================================================================

/// An output record whose fields keep their insertion order.
///
/// The processor inserts fields in `target_position` order so the writer can
/// concatenate values without re-sorting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedRecord {
    fields: Vec<(String, String)>,
}

impl OrderedRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a field. Ordering is the caller's responsibility.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterate over values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// Record Helpers
// ============================================================================

/// Convert a record field to its string form for comparison and output.
///
/// Strings pass through unquoted; numbers and booleans use their display
/// form; null and missing become empty.
pub fn field_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Look up a record field by exact name, falling back to a case-insensitive
/// scan over the record keys.
pub fn lookup_field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    if let Some(value) = record.get(name) {
        return Some(value);
    }
    record
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}
