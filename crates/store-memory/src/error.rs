use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// Lock poisoned or other internal inconsistency.
    #[error("internal store error: {0}")]
    Internal(String),
}
