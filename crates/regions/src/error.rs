use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to deserialize a stored region record.
    #[error("corrupt region record: {0}")]
    Corrupt(String),

    /// Underlying storage error.
    #[error("store error: {0}")]
    Store(String),
}
