use std::fmt;

use crate::journal::JournalError;
use crate::lock::LockError;
use crate::model::ChangeType;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    VersionNotFound,
    ContentNotFound,
    BranchNotFound,
    InvalidReference,
    UnsupportedChange,
    JournalCorrupt,
    JournalWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::VersionNotFound => "E2001",
            Self::ContentNotFound => "E2002",
            Self::BranchNotFound => "E2003",
            Self::InvalidReference => "E2004",
            Self::UnsupportedChange => "E2005",
            Self::JournalCorrupt => "E3001",
            Self::JournalWriteFailed => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::VersionNotFound => "Version not found",
            Self::ContentNotFound => "Content not found",
            Self::BranchNotFound => "Branch not found",
            Self::InvalidReference => "Invalid parent reference",
            Self::UnsupportedChange => "Unsupported change type",
            Self::JournalCorrupt => "Corrupt journal",
            Self::JournalWriteFailed => "Journal write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .verso/config.toml and retry."),
            Self::VersionNotFound => Some("Check the version id with `verso tree <content-id>`."),
            Self::ContentNotFound => Some("List known content with `verso list`."),
            Self::BranchNotFound => Some("Branch names are listed by `verso tree <content-id>`."),
            Self::InvalidReference => {
                Some("A version can only be parented to a version that already exists.")
            }
            Self::UnsupportedChange => {
                Some("Merge versions are not supported; use commit, branch or rollback.")
            }
            Self::JournalCorrupt => {
                Some("Inspect .verso/journal.log; the reported line failed validation.")
            }
            Self::JournalWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `verso` process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The kind of identifier a failed lookup was searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingKind {
    Version,
    Content,
    Branch,
}

impl fmt::Display for MissingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Version => "version",
            Self::Content => "content",
            Self::Branch => "branch",
        })
    }
}

/// Errors raised by the version store and lineage operations.
#[derive(Debug, thiserror::Error)]
pub enum LineageError {
    /// A version, content or branch id does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: MissingKind, id: String },

    /// A parent/base id violates the no-forward-reference invariant.
    #[error("invalid reference to {id}: {reason}")]
    InvalidReference { id: String, reason: String },

    /// The requested change type has no constructing operation.
    #[error("change type '{0}' cannot be created")]
    UnsupportedChange(ChangeType),

    /// The durable append failed; nothing was applied.
    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl LineageError {
    pub(crate) fn version_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: MissingKind::Version,
            id: id.to_string(),
        }
    }

    pub(crate) fn content_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: MissingKind::Content,
            id: id.to_string(),
        }
    }

    pub(crate) fn branch_not_found(name: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: MissingKind::Branch,
            id: name.to_string(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { kind, .. } => match kind {
                MissingKind::Version => ErrorCode::VersionNotFound,
                MissingKind::Content => ErrorCode::ContentNotFound,
                MissingKind::Branch => ErrorCode::BranchNotFound,
            },
            Self::InvalidReference { .. } => ErrorCode::InvalidReference,
            Self::UnsupportedChange(_) => ErrorCode::UnsupportedChange,
            Self::Journal(err) => err.code(),
        }
    }

    /// True for any of the three not-found conditions.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<LockError> for LineageError {
    fn from(err: LockError) -> Self {
        Self::Journal(JournalError::Lock(err))
    }
}
