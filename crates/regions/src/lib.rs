//! Region Registry: the authoritative catalog of PII regions and their
//! public base URLs. Seeded once at boot; read-mostly thereafter. Regions
//! are never updated or deleted.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod region;

pub use error::Error;
pub use region::RegionRecord;

use agora_store::{Store, Store1};
use async_trait::async_trait;
use bytes::Bytes;
use url::Url;
use uuid::Uuid;

/// Name of the region created by [`RegionManagement::seed_default_region`].
pub const DEFAULT_REGION_NAME: &str = "default";

/// Options for creating a new [`RegionManager`].
pub struct RegionManagerOptions<S>
where
    S: Store1,
{
    /// Base URL assigned to the default region when it is first seeded.
    pub default_region_base_url: Url,

    /// The store holding region records.
    pub store: S,
}

/// Trait for managing the region catalog.
#[async_trait]
pub trait RegionManagement
where
    Self: Clone + Send + Sync + 'static,
{
    /// Region store type.
    type Store: Store1;

    /// Creates a new instance of the region manager.
    fn new(options: RegionManagerOptions<Self::Store>) -> Self;

    /// Registers a region under `name`, or returns the existing region of
    /// that name. Names are claimed atomically, so concurrent callers
    /// converge on a single record per name.
    async fn add_region(&self, name: &str, base_url: Url) -> Result<RegionRecord, Error>;

    /// Returns the region with the given id, if any.
    async fn get_region(&self, id: Uuid) -> Result<Option<RegionRecord>, Error>;

    /// Returns all regions. Order is not significant.
    async fn list_regions(&self) -> Result<Vec<RegionRecord>, Error>;

    /// Ensures the well-known default region exists. Idempotent; safe to
    /// call on every process start.
    async fn seed_default_region(&self) -> Result<RegionRecord, Error>;
}

/// Manages the region catalog on top of a scoped key-value store.
#[derive(Clone)]
pub struct RegionManager<S>
where
    S: Store1,
{
    default_region_base_url: Url,
    names: S::Scoped,
    records: S::Scoped,
}

impl<S> RegionManager<S>
where
    S: Store1,
{
    fn decode(bytes: &Bytes) -> Result<RegionRecord, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Corrupt(e.to_string()))
    }

    fn encode(record: &RegionRecord) -> Result<Bytes, Error> {
        serde_json::to_vec(record)
            .map(Bytes::from)
            .map_err(|e| Error::Corrupt(e.to_string()))
    }
}

#[async_trait]
impl<S> RegionManagement for RegionManager<S>
where
    S: Store1,
{
    type Store = S;

    fn new(
        RegionManagerOptions {
            default_region_base_url,
            store,
        }: RegionManagerOptions<S>,
    ) -> Self {
        Self {
            default_region_base_url,
            names: store.scope("names"),
            records: store.scope("records"),
        }
    }

    async fn add_region(&self, name: &str, base_url: Url) -> Result<RegionRecord, Error> {
        loop {
            if let Some(id_bytes) = self
                .names
                .get(name)
                .await
                .map_err(|e| Error::Store(e.to_string()))?
            {
                let id = String::from_utf8_lossy(&id_bytes).to_string();
                match self
                    .records
                    .get(id)
                    .await
                    .map_err(|e| Error::Store(e.to_string()))?
                {
                    Some(bytes) => return Self::decode(&bytes),
                    // Name claimed but record not yet visible; retry.
                    None => continue,
                }
            }

            let candidate = RegionRecord {
                id: Uuid::new_v4(),
                name: name.to_string(),
                base_url: base_url.clone(),
            };

            // Record first, then the name claim, so a claimed name always
            // resolves to a readable record.
            self.records
                .put(candidate.id.to_string(), Self::encode(&candidate)?)
                .await
                .map_err(|e| Error::Store(e.to_string()))?;

            let claimed = self
                .names
                .put_if_absent(name, Bytes::from(candidate.id.to_string()))
                .await
                .map_err(|e| Error::Store(e.to_string()))?;

            if claimed {
                tracing::info!(region_id = %candidate.id, region_name = name, "region registered");
                return Ok(candidate);
            }

            // Lost the claim; discard the candidate and return the winner.
            self.records
                .del(candidate.id.to_string())
                .await
                .map_err(|e| Error::Store(e.to_string()))?;
        }
    }

    async fn get_region(&self, id: Uuid) -> Result<Option<RegionRecord>, Error> {
        let bytes = self
            .records
            .get(id.to_string())
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        bytes.as_ref().map(Self::decode).transpose()
    }

    async fn list_regions(&self) -> Result<Vec<RegionRecord>, Error> {
        let keys = self
            .records
            .keys()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        let mut regions = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = self
                .records
                .get(key)
                .await
                .map_err(|e| Error::Store(e.to_string()))?
            {
                regions.push(Self::decode(&bytes)?);
            }
        }

        Ok(regions)
    }

    async fn seed_default_region(&self) -> Result<RegionRecord, Error> {
        self.add_region(DEFAULT_REGION_NAME, self.default_region_base_url.clone())
            .await
    }
}
