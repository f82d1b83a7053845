//! Journal record parsing and validation.

use std::fmt;

use crate::store::StoreEvent;

use super::writer::record_hash;

/// A successfully parsed journal line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Comment(String),
    Blank,
    Record { seq: u64, event: StoreEvent },
}

/// Why a journal line failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    FieldCount { found: usize },
    InvalidSeq(String),
    InvalidJson(String),
    /// The kind column disagrees with the decoded event.
    KindMismatch { column: String, event: &'static str },
    InvalidHash(String),
    HashMismatch { expected: String, computed: String },
    /// Written by a newer journal format.
    VersionMismatch(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldCount { found } => {
                write!(f, "expected 4 tab-separated fields, found {found}")
            }
            Self::InvalidSeq(raw) => write!(f, "invalid sequence number '{raw}'"),
            Self::InvalidJson(msg) => write!(f, "invalid event payload: {msg}"),
            Self::KindMismatch { column, event } => {
                write!(f, "kind column '{column}' does not match payload kind '{event}'")
            }
            Self::InvalidHash(raw) => write!(f, "malformed record hash '{raw}'"),
            Self::HashMismatch { expected, computed } => {
                write!(f, "record hash mismatch: line has {expected}, computed {computed}")
            }
            Self::VersionMismatch(header) => {
                write!(f, "unsupported journal format '{header}'; upgrade verso to read it")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Check the first line of a journal file.
///
/// # Errors
///
/// [`ParseError::VersionMismatch`] for a `# verso journal vN` header with an
/// unsupported `N`.
pub fn check_header(line: &str) -> Result<(), ParseError> {
    let trimmed = line.trim_end();
    match trimmed.strip_prefix("# verso journal v") {
        Some("1") | None => Ok(()),
        Some(_) => Err(ParseError::VersionMismatch(trimmed.to_string())),
    }
}

/// Parse one journal line (with or without its trailing newline).
///
/// # Errors
///
/// A [`ParseError`] describing the first failed check.
pub fn parse_line(line: &str) -> Result<ParsedLine, ParseError> {
    let trimmed = line.trim_end_matches('\n').trim_end_matches('\r');

    if trimmed.starts_with('#') {
        return Ok(ParsedLine::Comment(trimmed.to_string()));
    }
    if trimmed.trim().is_empty() {
        return Ok(ParsedLine::Blank);
    }

    let fields: Vec<&str> = trimmed.split('\t').collect();
    let [seq_raw, kind, payload, hash] = fields.as_slice() else {
        return Err(ParseError::FieldCount {
            found: fields.len(),
        });
    };

    let seq: u64 = seq_raw
        .parse()
        .map_err(|_| ParseError::InvalidSeq((*seq_raw).to_string()))?;

    let hex = hash
        .strip_prefix("blake3:")
        .filter(|h| !h.is_empty() && h.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| ParseError::InvalidHash((*hash).to_string()))?;
    let computed = record_hash(seq, kind, payload);
    if computed.strip_prefix("blake3:") != Some(hex) {
        return Err(ParseError::HashMismatch {
            expected: (*hash).to_string(),
            computed,
        });
    }

    let event: StoreEvent =
        serde_json::from_str(payload).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    if event.kind() != *kind {
        return Err(ParseError::KindMismatch {
            column: (*kind).to_string(),
            event: event.kind(),
        });
    }

    Ok(ParsedLine::Record { seq, event })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::writer::{JOURNAL_HEADER, to_line};
    use crate::model::{ContentType, GenerationContext, VersionDraft, content_from};
    use crate::store::VersionStore;
    use chrono::{TimeZone, Utc};

    fn event() -> StoreEvent {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let ctx = GenerationContext::new("prompt", "ollama", "llama3", 0.7, "moderate", ts)
            .with_parameter("top_p", 0.9);
        VersionStore::initial_event(
            ContentType::PowerSystem,
            VersionDraft::new(content_from([("rules", "mana"), ("tiers", "3")]), ctx)
                .description("Initial")
                .tag("magic"),
            ts,
        )
    }

    #[test]
    fn written_line_parses_back() {
        let original = event();
        let line = to_line(7, &original).unwrap();
        match parse_line(&line).unwrap() {
            ParsedLine::Record { seq, event } => {
                assert_eq!(seq, 7);
                assert_eq!(event, original);
            }
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn comments_and_blanks() {
        assert_eq!(
            parse_line(JOURNAL_HEADER).unwrap(),
            ParsedLine::Comment(JOURNAL_HEADER.to_string())
        );
        assert_eq!(parse_line("   \n").unwrap(), ParsedLine::Blank);
    }

    #[test]
    fn tampered_payload_fails_hash() {
        let line = to_line(1, &event()).unwrap().replace("mana", "mama");
        assert!(matches!(parse_line(&line), Err(ParseError::HashMismatch { .. })));
    }

    #[test]
    fn wrong_field_count() {
        assert_eq!(
            parse_line("1\tlineage.create\t{}"),
            Err(ParseError::FieldCount { found: 3 })
        );
    }

    #[test]
    fn bad_sequence_and_hash_format() {
        assert!(matches!(
            parse_line("x\tlineage.create\t{}\tblake3:00"),
            Err(ParseError::InvalidSeq(_))
        ));
        assert!(matches!(
            parse_line("1\tlineage.create\t{}\tsha256:00"),
            Err(ParseError::InvalidHash(_))
        ));
    }

    #[test]
    fn kind_column_must_match_payload() {
        let line = to_line(1, &event()).unwrap();
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        let forged_hash = record_hash(1, "branch.fork", fields[2]);
        let forged = format!("1\tbranch.fork\t{}\t{forged_hash}", fields[2]);
        assert!(matches!(
            parse_line(&forged),
            Err(ParseError::KindMismatch { event: "lineage.create", .. })
        ));
    }

    #[test]
    fn newer_header_is_rejected() {
        assert!(check_header(JOURNAL_HEADER).is_ok());
        assert!(matches!(
            check_header("# verso journal v2"),
            Err(ParseError::VersionMismatch(_))
        ));
    }
}
