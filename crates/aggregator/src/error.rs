use thiserror::Error;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The comment location index could not be queried. Without the index
    /// there is nowhere to fan out to, so this is a hard failure.
    #[error("location index error: {0}")]
    Locations(#[from] agora_locations::Error),
}
