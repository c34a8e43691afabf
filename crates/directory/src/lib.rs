//! Routing Directory: the single source of truth for "which region owns
//! this user's PII". Supports create-or-reassign and lookup, keyed by the
//! derived user key rather than the raw email.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod routed_user;

pub use error::Error;
pub use routed_user::RoutedUser;

use agora_identity::compute_user_key;
use agora_regions::RegionManagement;
use agora_store::Store;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

/// Options for creating a new [`DirectoryManager`].
pub struct DirectoryManagerOptions<RM, S>
where
    RM: RegionManagement,
    S: Store,
{
    /// The region registry used to validate assignments.
    pub regions: RM,

    /// The store holding routed-user records, keyed by user key.
    pub store: S,
}

/// Trait for managing region assignments.
#[async_trait]
pub trait DirectoryManagement
where
    Self: Clone + Send + Sync + 'static,
{
    /// Region registry type.
    type Regions: RegionManagement;

    /// Routed-user store type.
    type Store: Store;

    /// Creates a new instance of the directory manager.
    fn new(options: DirectoryManagerOptions<Self::Regions, Self::Store>) -> Self;

    /// Assigns `email`'s user to `region_id`, creating the record on first
    /// assignment and overwriting it on reassignment (last writer wins; no
    /// history is kept). The region must exist in the registry.
    async fn upsert_route(&self, email: &str, region_id: Uuid) -> Result<RoutedUser, Error>;

    /// Returns the current assignment for `email`'s user, or `None` if
    /// the user has not picked a region yet.
    async fn get_route(&self, email: &str) -> Result<Option<RoutedUser>, Error>;
}

/// Manages region assignments on top of a key-value store.
#[derive(Clone)]
pub struct DirectoryManager<RM, S>
where
    RM: RegionManagement,
    S: Store,
{
    regions: RM,
    store: S,
}

impl<RM, S> DirectoryManager<RM, S>
where
    RM: RegionManagement,
    S: Store,
{
    fn decode(bytes: &Bytes) -> Result<RoutedUser, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Corrupt(e.to_string()))
    }

    fn encode(user: &RoutedUser) -> Result<Bytes, Error> {
        serde_json::to_vec(user)
            .map(Bytes::from)
            .map_err(|e| Error::Corrupt(e.to_string()))
    }
}

#[async_trait]
impl<RM, S> DirectoryManagement for DirectoryManager<RM, S>
where
    RM: RegionManagement,
    S: Store,
{
    type Regions = RM;
    type Store = S;

    fn new(DirectoryManagerOptions { regions, store }: DirectoryManagerOptions<RM, S>) -> Self {
        Self { regions, store }
    }

    async fn upsert_route(&self, email: &str, region_id: Uuid) -> Result<RoutedUser, Error> {
        if email.trim().is_empty() {
            return Err(Error::EmailRequired);
        }

        if region_id.is_nil() {
            return Err(Error::RegionRequired);
        }

        if self.regions.get_region(region_id).await?.is_none() {
            return Err(Error::RegionNotFound(region_id));
        }

        let key = compute_user_key(email);

        // Compare-and-swap loop: concurrent upserts for the same key
        // serialize on the stored record, so the final state is always one
        // attempted write in full, never an interleaving.
        loop {
            let current = self
                .store
                .get(key.as_str())
                .await
                .map_err(|e| Error::Store(e.to_string()))?;

            let (next, previous_region_id) = match &current {
                None => (
                    RoutedUser {
                        key: key.clone(),
                        region_id,
                        created_at: Utc::now(),
                        updated_at: None,
                    },
                    None,
                ),
                Some(bytes) => {
                    let existing = Self::decode(bytes)?;
                    let previous = existing.region_id;
                    (
                        RoutedUser {
                            region_id,
                            updated_at: Some(Utc::now()),
                            ..existing
                        },
                        Some(previous),
                    )
                }
            };

            let swapped = self
                .store
                .compare_and_swap(key.as_str(), current, Self::encode(&next)?)
                .await
                .map_err(|e| Error::Store(e.to_string()))?;

            if swapped {
                match previous_region_id {
                    // Reassignment hook: the prior region's data is not
                    // migrated or deleted, so surface where it was left.
                    Some(previous) if previous != region_id => {
                        tracing::info!(
                            user_key = %next.key,
                            previous_region_id = %previous,
                            region_id = %region_id,
                            "route reassigned"
                        );
                    }
                    Some(_) => {}
                    None => {
                        tracing::info!(user_key = %next.key, region_id = %region_id, "route created");
                    }
                }

                return Ok(next);
            }
        }
    }

    async fn get_route(&self, email: &str) -> Result<Option<RoutedUser>, Error> {
        let key = compute_user_key(email);

        let bytes = self
            .store
            .get(key.as_str())
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        bytes.as_ref().map(Self::decode).transpose()
    }
}
