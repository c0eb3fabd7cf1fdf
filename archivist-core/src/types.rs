//! Domain types for archived records.
//!
//! A [`Record`] keeps the exact source line next to its parsed value: the line
//! is what gets written back out, the value is what gets hashed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// Canonical form + hash
// ---------------------------------------------------------------------------

/// Rebuild `value` with every object's keys in lexicographic order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Deterministic, key-sorted compact serialization of `value`.
///
/// Two values with the same keys and values produce the same string no matter
/// which order their keys appeared in on disk.
pub fn canonical_form(value: &Value) -> String {
    canonicalize(value).to_string()
}

/// 128-bit dedup key: the first 16 bytes of the SHA-256 of the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHash(pub [u8; 16]);

impl RecordHash {
    pub fn of(value: &Value) -> Self {
        let digest = Sha256::digest(canonical_form(value).as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest[..16]);
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One JSON value read from one line of input.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    raw: String,
    value: Value,
}

impl Record {
    /// Parse a single line. Trailing `\n` / `\r\n` is stripped from the kept
    /// raw text so it can be re-emitted verbatim.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        let raw = line.trim_end_matches(['\n', '\r']);
        let value = serde_json::from_str(raw)?;
        Ok(Self {
            raw: raw.to_owned(),
            value,
        })
    }

    /// The source line, exactly as read (minus its terminator).
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn hash(&self) -> RecordHash {
        RecordHash::of(&self.value)
    }

    /// `true` when the record's top-level `id` is numerically equal to
    /// `sentinel_id`. Non-objects and non-numeric ids never match; a boolean
    /// `id` is not a number.
    pub fn is_sentinel(&self, sentinel_id: i64) -> bool {
        let Some(Value::Number(n)) = self.value.get("id") else {
            return false;
        };
        // Integers compare exactly; only floats go through f64.
        if let Some(i) = n.as_i64() {
            i == sentinel_id
        } else if n.is_u64() {
            false
        } else {
            n.as_f64() == Some(sentinel_id as f64)
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset metadata
// ---------------------------------------------------------------------------

/// Visibility of the published dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Private,
    Public,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Private => write!(f, "private"),
            AccessLevel::Public => write!(f, "public"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
}

/// Descriptor written next to the merged output as `dataset-metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub title: String,
    pub id: String,
    pub licenses: Vec<License>,
    #[serde(rename = "isPrivate")]
    pub is_private: bool,
}

impl DatasetMetadata {
    pub fn access(&self) -> AccessLevel {
        if self.is_private {
            AccessLevel::Private
        } else {
            AccessLevel::Public
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
