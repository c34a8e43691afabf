use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A location record with this comment id already exists.
    #[error("comment location already recorded: {0}")]
    AlreadyExists(String),

    /// Failed to deserialize a stored location record.
    #[error("corrupt location record: {0}")]
    Corrupt(String),

    /// Underlying storage error.
    #[error("store error: {0}")]
    Store(String),
}
