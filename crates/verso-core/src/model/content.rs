//! Content payloads: a string-keyed map of tagged values.
//!
//! The engine never interprets field semantics. It needs equality (for
//! diffs), a text form (for line diffs of string fields), and a serialized
//! form (for search). Values serialize to natural JSON, so a payload read
//! from a JSON object round-trips unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A content payload: field name to value.
pub type Content = BTreeMap<String, ContentValue>;

/// One value inside a content payload.
///
/// Variant order matters for untagged deserialization: integers are tried
/// before floats so `3` stays an integer and `3.5` becomes a float.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<ContentValue>),
    Map(BTreeMap<String, ContentValue>),
}

impl ContentValue {
    /// Borrow the string if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer and float values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// False if this value, or anything nested in it, is a NaN or infinite
    /// float. JSON has no encoding for those.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Float(f) => f.is_finite(),
            Self::List(items) => items.iter().all(Self::is_finite),
            Self::Map(map) => map.values().all(Self::is_finite),
            Self::Null | Self::Bool(_) | Self::Integer(_) | Self::Text(_) => true,
        }
    }

    /// Short lowercase name of the variant, used in diff output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }
}

// Integers and floats of the same numeric value compare equal. Floats also
// compare equal to themselves bitwise so a NaN field never shows up as a
// modification when a version is diffed against itself.
impl PartialEq for ContentValue {
    #[allow(clippy::cast_precision_loss)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_eq(*a, *b),
            (Self::Integer(a), Self::Float(b)) | (Self::Float(b), Self::Integer(a)) => {
                float_eq(*a as f64, *b)
            }
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || a == b
}

impl fmt::Display for ContentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            other => match serde_json::to_string(other) {
                Ok(json) => f.write_str(&json),
                Err(_) => f.write_str(other.kind()),
            },
        }
    }
}

impl From<&str> for ContentValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for ContentValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for ContentValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for ContentValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl<T: Into<Self>> From<Vec<T>> for ContentValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Serialize a payload to compact JSON for full-text matching.
#[must_use]
pub fn content_search_text(content: &Content) -> String {
    serde_json::to_string(content).unwrap_or_default()
}

/// Build a payload from `(field, value)` pairs.
pub fn content_from<K, V, I>(pairs: I) -> Content
where
    K: Into<String>,
    V: Into<ContentValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
