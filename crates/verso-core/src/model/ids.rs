//! Typed identifiers for lineages and versions.
//!
//! Both wrap an opaque string. Freshly issued ids are UUIDv7 text, so they
//! sort roughly by creation time, but callers may build an id from any
//! string for lookups; an unknown id is a not-found condition, never a
//! parse failure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one lineage (one piece of content).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

/// Globally unique identifier of one version.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

macro_rules! impl_typed_id {
    ($T:ident) => {
        impl $T {
            /// Issue a new time-ordered id (UUIDv7).
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::now_v7().to_string())
            }

            /// Borrow the raw string form.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First 8 characters, for human display only.
            #[must_use]
            pub fn short(&self) -> &str {
                self.0.get(..8).unwrap_or(&self.0)
            }
        }

        impl fmt::Display for $T {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $T {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $T {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $T {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_typed_id!(ContentId);
impl_typed_id!(VersionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = VersionId::generate();
        let b = VersionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn short_handles_tiny_ids() {
        assert_eq!(VersionId::from("abc").short(), "abc");
        assert_eq!(ContentId::from("0123456789").short(), "01234567");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = VersionId::from("v-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"v-1\"");
        let back: VersionId = serde_json::from_str("\"v-1\"").unwrap();
        assert_eq!(back, id);
    }
}
