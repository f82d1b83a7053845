//! Append-only journal of store events.
//!
//! Every accepted mutation is written here before it is applied in memory,
//! and the whole file is replayed through the same store `apply` path on
//! open. Format details live in [`writer`]; validation in [`parser`].
//!
//! Appends take an exclusive advisory lock on `.verso/lock`, so two `verso`
//! processes never interleave records. A trailing partial line left by a
//! crash is dropped with a warning on the next open.

pub mod canonical;
pub mod parser;
pub mod writer;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{EngineConfig, ProjectPaths};
use crate::error::ErrorCode;
use crate::lock::{JournalLock, LockError};
use crate::store::StoreEvent;

use parser::{ParsedLine, check_header, parse_line};
use writer::{journal_header, to_line};

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("journal line {line} is corrupt: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("failed to encode event: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),

    /// Another process appended since this journal was opened.
    #[error("journal changed on disk (expected {expected} bytes, found {found}); reopen to pick up new records")]
    Diverged { expected: u64, found: u64 },
}

impl JournalError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Corrupt { .. } => ErrorCode::JournalCorrupt,
            Self::Lock(err) => err.code(),
            Self::Io(_) | Self::Serialize(_) | Self::Diverged { .. } => {
                ErrorCode::JournalWriteFailed
            }
        }
    }
}

/// Durable sink for accepted store events.
pub trait HistoryLog: Send + Sync {
    /// Persist `event`. Must not return until the record is written.
    ///
    /// # Errors
    ///
    /// Any failure means the event must not be applied.
    fn append(&mut self, event: &StoreEvent) -> Result<(), JournalError>;
}

/// Line-oriented journal file.
#[derive(Debug)]
pub struct Journal {
    path: PathBuf,
    lock_path: PathBuf,
    durable: bool,
    lock_timeout: Duration,
    next_seq: u64,
    /// File length after our last read or write.
    known_len: u64,
}

impl Journal {
    /// Open (creating if needed) the journal for a project and read back
    /// every record, oldest first.
    ///
    /// # Errors
    ///
    /// - [`JournalError::Corrupt`] for a malformed line, a hash mismatch or
    ///   a sequence gap.
    /// - [`JournalError::Lock`] if a writer holds the lock past the timeout.
    pub fn open(
        project_root: &Path,
        config: &EngineConfig,
    ) -> Result<(Self, Vec<StoreEvent>), JournalError> {
        let paths = ProjectPaths::new(project_root, config);
        Self::open_at(
            &paths.journal,
            &paths.lock,
            config.journal.durable,
            config.journal.lock_timeout(),
        )
    }

    /// [`Self::open`] with explicit paths.
    ///
    /// # Errors
    ///
    /// See [`Self::open`].
    pub fn open_at(
        path: &Path,
        lock_path: &Path,
        durable: bool,
        lock_timeout: Duration,
    ) -> Result<(Self, Vec<StoreEvent>), JournalError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let (events, known_len) = {
            let _lock = JournalLock::acquire(lock_path, lock_timeout)?;
            ensure_header(path)?;
            recover_torn_tail(path)?;
            let text = fs::read_to_string(path)?;
            (replay_text(&text)?, text.len() as u64)
        };

        info!(path = %path.display(), records = events.len(), "journal opened");
        Ok((
            Self {
                path: path.to_path_buf(),
                lock_path: lock_path.to_path_buf(),
                durable,
                lock_timeout,
                next_seq: events.len() as u64 + 1,
                known_len,
            },
            events,
        ))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written so far.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.next_seq - 1
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryLog for Journal {
    fn append(&mut self, event: &StoreEvent) -> Result<(), JournalError> {
        let line = to_line(self.next_seq, event)?;

        let _lock = JournalLock::acquire(&self.lock_path, self.lock_timeout)?;
        let found = fs::metadata(&self.path)?.len();
        if found != self.known_len {
            return Err(JournalError::Diverged {
                expected: self.known_len,
                found,
            });
        }

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        if self.durable {
            file.sync_data()?;
        }

        debug!(seq = self.next_seq, kind = event.kind(), "journal append");
        self.next_seq += 1;
        self.known_len += line.len() as u64;
        Ok(())
    }
}

fn ensure_header(path: &Path) -> Result<(), JournalError> {
    if !fs::metadata(path).is_ok_and(|m| m.len() > 0) {
        fs::write(path, journal_header())?;
    }
    Ok(())
}

/// Drop a final unterminated line that does not parse. A final line that
/// parses but only lacks its newline is kept and terminated.
fn recover_torn_tail(path: &Path) -> Result<(), JournalError> {
    let content = fs::read(path)?;
    if content.last().is_none_or(|&b| b == b'\n') {
        return Ok(());
    }

    let keep = content.iter().rposition(|&b| b == b'\n').map_or(0, |pos| pos + 1);
    let tail = String::from_utf8_lossy(&content[keep..]);

    if parse_line(&tail).is_ok() {
        let mut file = OpenOptions::new().append(true).open(path)?;
        file.write_all(b"\n")?;
        return Ok(());
    }

    warn!(
        path = %path.display(),
        bytes = content.len() - keep,
        "dropping torn journal tail"
    );
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_len(keep as u64)?;
    Ok(())
}

fn replay_text(text: &str) -> Result<Vec<StoreEvent>, JournalError> {
    let mut events = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if line == 1 {
            check_header(raw).map_err(|e| corrupt(line, &e))?;
        }
        match parse_line(raw).map_err(|e| corrupt(line, &e))? {
            ParsedLine::Comment(_) | ParsedLine::Blank => {}
            ParsedLine::Record { seq, event } => {
                let expected = events.len() as u64 + 1;
                if seq != expected {
                    return Err(JournalError::Corrupt {
                        line,
                        reason: format!("sequence {seq} out of order, expected {expected}"),
                    });
                }
                events.push(event);
            }
        }
    }
    Ok(events)
}

fn corrupt(line: usize, err: &parser::ParseError) -> JournalError {
    JournalError::Corrupt {
        line,
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, GenerationContext, VersionDraft, content_from};
    use crate::store::VersionStore;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn event(n: i64) -> StoreEvent {
        let ts = Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap();
        let ctx = GenerationContext::new("p", "ollama", "m", 0.7, "moderate", ts);
        VersionStore::initial_event(
            ContentType::StyleAnalysis,
            VersionDraft::new(content_from([("voice", format!("v{n}"))]), ctx),
            ts,
        )
    }

    fn open(dir: &TempDir) -> (Journal, Vec<StoreEvent>) {
        Journal::open_at(
            &dir.path().join("journal.log"),
            &dir.path().join("lock"),
            false,
            TIMEOUT,
        )
        .unwrap()
    }

    #[test]
    fn fresh_journal_has_header_only() {
        let dir = TempDir::new().unwrap();
        let (journal, events) = open(&dir);
        assert!(events.is_empty());
        assert!(journal.is_empty());
        let text = fs::read_to_string(journal.path()).unwrap();
        assert_eq!(text, journal_header());
    }

    #[test]
    fn appended_events_replay_in_order() {
        let dir = TempDir::new().unwrap();
        let (mut journal, _) = open(&dir);
        let written = vec![event(1), event(2), event(3)];
        for e in &written {
            journal.append(e).unwrap();
        }
        assert_eq!(journal.len(), 3);
        drop(journal);

        let (reopened, events) = open(&dir);
        assert_eq!(events, written);
        assert_eq!(reopened.len(), 3);
    }

    #[test]
    fn torn_tail_is_dropped_and_appends_continue() {
        let dir = TempDir::new().unwrap();
        let (mut journal, _) = open(&dir);
        journal.append(&event(1)).unwrap();
        drop(journal);

        let path = dir.path().join("journal.log");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"2\tversion.append\t{\"op\":").unwrap();
        drop(file);

        let (mut journal, events) = open(&dir);
        assert_eq!(events.len(), 1);
        journal.append(&event(2)).unwrap();
        drop(journal);
        assert_eq!(open(&dir).1.len(), 2);
    }

    #[test]
    fn complete_record_missing_newline_is_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.log");
        let line = to_line(1, &event(1)).unwrap();
        fs::write(&path, format!("{}{}", journal_header(), line.trim_end())).unwrap();

        let (_, events) = open(&dir);
        assert_eq!(events.len(), 1);
        assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
    }

    #[test]
    fn tampered_record_reports_line_number() {
        let dir = TempDir::new().unwrap();
        let (mut journal, _) = open(&dir);
        journal.append(&event(1)).unwrap();
        journal.append(&event(2)).unwrap();
        drop(journal);

        let path = dir.path().join("journal.log");
        let text = fs::read_to_string(&path).unwrap().replace("\"v2\"", "\"vX\"");
        fs::write(&path, text).unwrap();

        let err = Journal::open_at(&path, &dir.path().join("lock"), false, TIMEOUT).unwrap_err();
        assert!(matches!(err, JournalError::Corrupt { line: 4, .. }));
        assert_eq!(err.code(), ErrorCode::JournalCorrupt);
    }

    #[test]
    fn sequence_gap_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.log");
        let body = format!(
            "{}{}{}",
            journal_header(),
            to_line(1, &event(1)).unwrap(),
            to_line(3, &event(2)).unwrap()
        );
        fs::write(&path, body).unwrap();

        let err = Journal::open_at(&path, &dir.path().join("lock"), false, TIMEOUT).unwrap_err();
        assert!(matches!(err, JournalError::Corrupt { line: 4, ref reason } if reason.contains("sequence 3")));
    }

    #[test]
    fn concurrent_writer_is_detected() {
        let dir = TempDir::new().unwrap();
        let (mut first, _) = open(&dir);
        let (mut second, _) = open(&dir);
        first.append(&event(1)).unwrap();
        let err = second.append(&event(2)).unwrap_err();
        assert!(matches!(err, JournalError::Diverged { .. }));
    }

    #[test]
    fn held_lock_fails_append_with_contention_code() {
        let dir = TempDir::new().unwrap();
        let (mut journal, _) = open(&dir);
        let _held = JournalLock::acquire(&dir.path().join("lock"), TIMEOUT).unwrap();
        let err = journal.append(&event(1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::LockContention);
    }
}
