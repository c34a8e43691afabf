//! Key-value storage abstraction used by the residency routing core.
//!
//! Collections (regions, routed users, comment locations) are namespaced
//! with the scoped-store traits rather than separate backends, so a single
//! storage deployment can hold all three.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::error::Error;
use std::fmt::Debug;

use async_trait::async_trait;
use bytes::Bytes;

/// A key-value store with asynchronous operations.
///
/// Beyond plain reads and writes, implementations must provide two
/// conditional operations:
/// - [`Store::put_if_absent`] gives insert-level atomicity (claim a key
///   exactly once).
/// - [`Store::compare_and_swap`] gives per-record optimistic concurrency
///   (replace a value only if it has not changed since it was read).
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    /// The error type returned by the store.
    type Error: Debug + Error + Send + Sync;

    /// Deletes a key from the store.
    async fn del<K: Into<String> + Send>(&self, key: K) -> Result<(), Self::Error>;

    /// Retrieves the value associated with a key.
    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error>;

    /// Retrieves all keys in the store (scoped stores return keys without
    /// their scope prefix).
    async fn keys(&self) -> Result<Vec<String>, Self::Error>;

    /// Stores a key-value pair, overwriting any existing value.
    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error>;

    /// Stores a key-value pair only if the key is currently absent.
    /// Returns `true` if the write happened, `false` if the key was taken.
    async fn put_if_absent<K: Into<String> + Send>(
        &self,
        key: K,
        bytes: Bytes,
    ) -> Result<bool, Self::Error>;

    /// Replaces the value at `key` only if the current value equals
    /// `expected` (`None` expects the key to be absent). Returns `true` if
    /// the swap happened.
    async fn compare_and_swap<K: Into<String> + Send>(
        &self,
        key: K,
        expected: Option<Bytes>,
        new: Bytes,
    ) -> Result<bool, Self::Error>;
}

/// A store that can be narrowed to a single scope.
pub trait Store1: Clone + Send + Sync + 'static {
    /// The error type returned by the scoped store.
    type Error: Debug + Error + Send + Sync;

    /// The scoped store type.
    type Scoped: Store<Error = Self::Error>;

    /// Narrows the store to `scope` and makes it usable.
    fn scope<S: Into<String> + Send>(&self, scope: S) -> Self::Scoped;
}
