use thiserror::Error;

use crate::codec::FrameError;

/// The full error taxonomy the engine can surface. Every variant is
/// permanent; nothing here is retried internally.
#[derive(Debug, Error)]
pub enum SnapshotError<E> {
    #[error("failed writing snapshot: {0}")]
    SystemWriteError(String),

    #[error("failed reading snapshot: {0}")]
    SystemReadError(String),

    #[error("no context found for block header {0:x?}")]
    ContextNotFound(Vec<u8>),

    #[error("hash mismatch for {what}: got {got}, expected {expected}")]
    BadHash {
        what: &'static str,
        got: String,
        expected: String,
    },

    #[error("inconsistent snapshot file: {0}")]
    InconsistentSnapshotFile(String),

    #[error("inconsistent snapshot data: {0}")]
    InconsistentSnapshotData(String),

    #[error("snapshot ended before an `End` command was read")]
    MissingSnapshotData,

    #[error("invalid snapshot version: got {got:?}, expected {expected:?}")]
    InvalidSnapshotVersion { got: String, expected: String },

    #[error("failed to restore context: referenced hash was not found in the batch")]
    RestoreContextFailure,

    #[error(transparent)]
    Adapter(E),
}

pub type SnapshotResult<T, E> = Result<T, SnapshotError<E>>;

impl<E> From<FrameError> for SnapshotError<E> {
    fn from(e: FrameError) -> Self {
        match e {
            FrameError::Write(io_err) => SnapshotError::SystemWriteError(io_err.to_string()),
            FrameError::Read(io_err) => SnapshotError::SystemReadError(io_err.to_string()),
            FrameError::Malformed(msg) => SnapshotError::InconsistentSnapshotFile(msg),
        }
    }
}
