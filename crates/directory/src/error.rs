use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to deserialize a stored routing record.
    #[error("corrupt routing record: {0}")]
    Corrupt(String),

    /// Email missing or empty.
    #[error("email is required")]
    EmailRequired,

    /// Region id missing (nil uuid).
    #[error("region id is required")]
    RegionRequired,

    /// Region id does not reference a known region.
    #[error("region not found: {0}")]
    RegionNotFound(Uuid),

    /// Region registry error.
    #[error("region registry error: {0}")]
    Regions(#[from] agora_regions::Error),

    /// Underlying storage error.
    #[error("store error: {0}")]
    Store(String),
}
