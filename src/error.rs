//! Error types shared by the archive index and the filesystem layer.

use thiserror::Error;

/// Problems reading the mounted archive.
///
/// These are fatal to the single operation that hit them. The archive is
/// immutable, so none of them are retried here; remote sources retry
/// transient failures themselves before reporting `Unavailable`.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("corrupt archive header: {0}")]
    CorruptHeader(String),

    #[error("entry index {index} out of range ({count} entries)")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("failed to decode entry {index}: {reason}")]
    DecodeFailure { index: usize, reason: String },

    /// The byte source could not deliver a range (network failure, etc.).
    #[error("archive bytes unavailable: {0}")]
    Unavailable(String),
}

impl ArchiveError {
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        ArchiveError::CorruptHeader(reason.into())
    }

    pub(crate) fn decode(index: usize, reason: impl ToString) -> Self {
        ArchiveError::DecodeFailure {
            index,
            reason: reason.to_string(),
        }
    }
}

// Header fields are read through `byteorder` cursors; running off the end of
// a header means the container is truncated.
impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        ArchiveError::CorruptHeader(err.to_string())
    }
}

/// Errors surfaced to the host filesystem bridge.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory")]
    NotFound,

    #[error("access denied: the archive is mounted read-only")]
    AccessDenied,

    #[error("file exists")]
    FileExists,

    #[error("object name collision")]
    NameCollision,

    #[error("not a directory")]
    NotADirectory,

    #[error("is a directory")]
    IsADirectory,

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
