//! Journal record serialization.
//!
//! One record per line, four tab-separated fields:
//!
//! ```text
//! seq \t kind \t canonical_json \t blake3:<hex>
//! ```
//!
//! The hash covers `seq \t kind \t canonical_json \n`.

use serde::ser::Error as _;

use crate::model::{Content, Version};
use crate::store::StoreEvent;

use super::JournalError;
use super::canonical::canonicalize_json;

/// First line of every journal file.
pub const JOURNAL_HEADER: &str = "# verso journal v1";

/// Field-description comment written after the header.
pub const FIELD_COMMENT: &str = "# fields: seq\tkind\tevent\trecord_hash";

/// Header block for a new journal, with trailing newline.
#[must_use]
pub fn journal_header() -> String {
    format!("{JOURNAL_HEADER}\n{FIELD_COMMENT}\n")
}

/// BLAKE3 over the first three fields, as `blake3:<hex>`.
#[must_use]
pub fn record_hash(seq: u64, kind: &str, payload: &str) -> String {
    let hash = blake3::hash(format!("{seq}\t{kind}\t{payload}\n").as_bytes());
    format!("blake3:{hash}")
}

/// Canonical JSON payload for an event.
///
/// # Errors
///
/// [`JournalError::Serialize`] if the event cannot be encoded, holds a
/// non-finite float anywhere, or would not decode back.
pub fn event_payload(event: &StoreEvent) -> Result<String, JournalError> {
    if let Some(field) = non_finite_field(event.version()) {
        return Err(serde_json::Error::custom(format!("{field} is not a finite number")).into());
    }
    let value = serde_json::to_value(event)?;
    let payload = canonicalize_json(&value);
    serde_json::from_str::<StoreEvent>(&payload)?;
    Ok(payload)
}

/// First field holding NaN or infinity. `serde_json` would write those as
/// `null`, which replays as a different value.
fn non_finite_field(version: &Version) -> Option<String> {
    fn in_content(prefix: &str, content: &Content) -> Option<String> {
        content
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(key, _)| format!("{prefix}.{key}"))
    }

    let ctx = &version.prompt_context;
    if !ctx.temperature.is_finite() {
        return Some("prompt_context.temperature".to_string());
    }
    in_content("content_data", &version.content_data)
        .or_else(|| {
            ctx.character_context
                .as_ref()
                .and_then(|c| in_content("prompt_context.character_context", c))
        })
        .or_else(|| {
            ctx.additional_parameters
                .iter()
                .find(|(_, value)| !value.is_finite())
                .map(|(key, _)| format!("prompt_context.additional_parameters.{key}"))
        })
        .or_else(|| {
            version
                .metrics
                .iter()
                .find(|(_, value)| !value.is_finite())
                .map(|(name, _)| format!("metrics.{name}"))
        })
}

/// Serialize an event as a complete journal line, newline included.
///
/// # Errors
///
/// See [`event_payload`].
pub fn to_line(seq: u64, event: &StoreEvent) -> Result<String, JournalError> {
    let kind = event.kind();
    let payload = event_payload(event)?;
    let hash = record_hash(seq, kind, &payload);
    Ok(format!("{seq}\t{kind}\t{payload}\t{hash}\n"))
}
