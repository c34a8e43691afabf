//! Comment Location Index: a durable record of "this comment lives in
//! this region", written once at comment-creation time and queryable by
//! post. The index answers "where", never "what"; comment bodies stay in
//! their regional PII stores.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use agora_store::{Store, Store1};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a single comment's content lives. Written exactly once; never
/// mutated or deleted (deleting the underlying comment does not retract
/// its location record).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLocation {
    /// Caller-supplied unique comment id.
    pub comment_id: String,

    /// Derived key of the comment's author.
    pub user_key: String,

    /// The post the comment belongs to.
    pub post_id: String,

    /// The region holding the comment's body.
    pub region_id: Uuid,

    /// When the comment was created in its regional store.
    pub created_at: DateTime<Utc>,
}

/// Options for creating a new [`LocationIndexManager`].
pub struct LocationIndexManagerOptions<S>
where
    S: Store1,
{
    /// The store holding location records.
    pub store: S,
}

/// Trait for managing the comment location index.
#[async_trait]
pub trait LocationIndexManagement
where
    Self: Clone + Send + Sync + 'static,
{
    /// Location store type.
    type Store: Store1;

    /// Creates a new instance of the location index manager.
    fn new(options: LocationIndexManagerOptions<Self::Store>) -> Self;

    /// Records where a comment lives. Pure insert: reusing a comment id is
    /// a caller error and fails with [`Error::AlreadyExists`], leaving the
    /// original record unchanged.
    async fn record_comment_location(
        &self,
        location: CommentLocation,
    ) -> Result<CommentLocation, Error>;

    /// Returns all location records for a post, across all regions.
    /// Unordered; ordering of fetched bodies is the aggregator's concern.
    async fn find_by_post(&self, post_id: &str) -> Result<Vec<CommentLocation>, Error>;
}

/// Manages the comment location index on top of a scoped key-value store.
#[derive(Clone)]
pub struct LocationIndexManager<S>
where
    S: Store1,
{
    ids: S::Scoped,
    posts: S,
}

impl<S> LocationIndexManager<S>
where
    S: Store1,
{
    fn decode(bytes: &Bytes) -> Result<CommentLocation, Error> {
        serde_json::from_slice(bytes).map_err(|e| Error::Corrupt(e.to_string()))
    }

    fn encode(location: &CommentLocation) -> Result<Bytes, Error> {
        serde_json::to_vec(location)
            .map(Bytes::from)
            .map_err(|e| Error::Corrupt(e.to_string()))
    }

    fn post_scope(&self, post_id: &str) -> S::Scoped {
        self.posts.scope(format!("post:{post_id}"))
    }
}

#[async_trait]
impl<S> LocationIndexManagement for LocationIndexManager<S>
where
    S: Store1,
{
    type Store = S;

    fn new(LocationIndexManagerOptions { store }: LocationIndexManagerOptions<S>) -> Self {
        Self {
            ids: store.scope("ids"),
            posts: store,
        }
    }

    async fn record_comment_location(
        &self,
        location: CommentLocation,
    ) -> Result<CommentLocation, Error> {
        let encoded = Self::encode(&location)?;

        // Claim the comment id first; the per-post index entry follows
        // only for the winner, so a duplicate never shadows the original.
        let claimed = self
            .ids
            .put_if_absent(location.comment_id.clone(), encoded.clone())
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        if !claimed {
            return Err(Error::AlreadyExists(location.comment_id));
        }

        self.post_scope(&location.post_id)
            .put(location.comment_id.clone(), encoded)
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        Ok(location)
    }

    async fn find_by_post(&self, post_id: &str) -> Result<Vec<CommentLocation>, Error> {
        let scope = self.post_scope(post_id);

        let keys = scope
            .keys()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        let mut locations = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = scope
                .get(key)
                .await
                .map_err(|e| Error::Store(e.to_string()))?
            {
                let location = Self::decode(&bytes)?;
                // Scope prefixes are plain `:`-joined strings, so a post id
                // containing `:` can alias a sibling scope; the stored
                // record is authoritative.
                if location.post_id == post_id {
                    locations.push(location);
                }
            }
        }

        Ok(locations)
    }
}
