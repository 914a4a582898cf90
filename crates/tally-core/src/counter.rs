//! Counter record model and response shaping.
//!
//! A counter record is addressed by `(table, id, attribute)` and holds one
//! non-negative integer. It is only ever touched through an atomic
//! add-and-fetch; a record that does not exist yet behaves as zero.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, TallyError};

/// Prefix of the error description returned by endpoints that answer store
/// failures themselves.
pub const STORE_ERROR_PREFIX: &str = "Error updating count:";

/// Address of one counter record attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    /// Logical table holding the record.
    pub table: String,
    /// Fixed partition key value (e.g. `visitors`).
    pub id: String,
    /// Numeric attribute incremented on the record (e.g. `visitor_count`).
    pub attribute: String,
}

impl CounterKey {
    pub fn new(
        table: impl Into<String>,
        id: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            id: id.into(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for CounterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}", self.table, self.id, self.attribute)
    }
}

/// Post-update value of a counter attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Count(u64);

impl Count {
    pub const ZERO: Count = Count(0);

    pub fn new(v: u64) -> Self {
        Self(v)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Additive update. Overflow is a store failure, never a wrap.
    pub fn checked_add(self, delta: u64) -> Result<Count> {
        self.0
            .checked_add(delta)
            .map(Count)
            .ok_or_else(|| TallyError::Store(format!("counter overflow adding {delta} to {}", self.0)))
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Names usable as table or attribute identifiers in every backend:
/// non-empty ASCII alphanumerics, `_` and `-`.
pub fn is_valid_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Success body: a JSON object with the count under `field`.
pub fn count_body(field: &str, count: Count) -> Value {
    let mut obj = Map::with_capacity(1);
    obj.insert(field.to_string(), Value::from(count.get()));
    Value::Object(obj)
}

/// Failure body for endpoints that answer store errors themselves:
/// a JSON string describing the error.
pub fn store_error_body(err: &TallyError) -> Value {
    Value::String(format!("{STORE_ERROR_PREFIX} {err}"))
}
