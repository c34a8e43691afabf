//! In-memory (single node) implementation of key-value storage for local
//! development and tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::HashMap;
use std::sync::Arc;

use agora_store::{Store, Store1};
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;

/// In-memory key-value store. Scoped handles share the underlying map
/// under a `:`-joined key prefix, so data written through one handle is
/// visible to any equally-scoped handle derived from the same root.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<HashMap<String, Bytes>>>,
    prefix: Option<String>,
}

impl MemoryStore {
    /// Creates a new `MemoryStore`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: Arc::new(Mutex::new(HashMap::new())),
            prefix: None,
        }
    }

    fn get_key<K: Into<String>>(&self, key: K) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, key.into()),
            None => key.into(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Error = Error;

    async fn del<K: Into<String> + Send>(&self, key: K) -> Result<(), Self::Error> {
        self.map.lock().await.remove(&self.get_key(key));
        Ok(())
    }

    async fn get<K: Into<String> + Send>(&self, key: K) -> Result<Option<Bytes>, Self::Error> {
        let map = self.map.lock().await;
        Ok(map.get(&self.get_key(key)).cloned())
    }

    async fn keys(&self) -> Result<Vec<String>, Self::Error> {
        let map = self.map.lock().await;
        let keys = match &self.prefix {
            Some(prefix) => {
                let prefix = format!("{prefix}:");
                map.keys()
                    .filter_map(|key| key.strip_prefix(&prefix))
                    .map(String::from)
                    .collect()
            }
            None => map.keys().cloned().collect(),
        };
        Ok(keys)
    }

    async fn put<K: Into<String> + Send>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error> {
        self.map.lock().await.insert(self.get_key(key), bytes);
        Ok(())
    }

    async fn put_if_absent<K: Into<String> + Send>(
        &self,
        key: K,
        bytes: Bytes,
    ) -> Result<bool, Self::Error> {
        let mut map = self.map.lock().await;
        let key = self.get_key(key);
        if map.contains_key(&key) {
            return Ok(false);
        }
        map.insert(key, bytes);
        Ok(true)
    }

    async fn compare_and_swap<K: Into<String> + Send>(
        &self,
        key: K,
        expected: Option<Bytes>,
        new: Bytes,
    ) -> Result<bool, Self::Error> {
        let mut map = self.map.lock().await;
        let key = self.get_key(key);
        if map.get(&key) != expected.as_ref() {
            return Ok(false);
        }
        map.insert(key, new);
        Ok(true)
    }
}

impl Store1 for MemoryStore {
    type Error = Error;
    type Scoped = Self;

    fn scope<S: Into<String> + Send>(&self, scope: S) -> Self::Scoped {
        let prefix = match &self.prefix {
            Some(existing) => format!("{}:{}", existing, scope.into()),
            None => scope.into(),
        };
        Self {
            map: self.map.clone(),
            prefix: Some(prefix),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        let key = "test_key".to_string();
        let value = Bytes::from_static(b"test_value");

        store.put(key.clone(), value.clone()).await.unwrap();
        let result = store.get(key).await.unwrap();

        assert_eq!(result, Some(value));
    }

    #[tokio::test]
    async fn test_del() {
        let store = MemoryStore::new();
        let key = "test_key".to_string();
        let value = Bytes::from_static(b"test_value");

        store.put(key.clone(), value.clone()).await.unwrap();
        store.del(key.clone()).await.unwrap();
        let result = store.get(key).await.unwrap();

        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_put_if_absent() {
        let store = MemoryStore::new();
        let original = Bytes::from_static(b"original");
        let replacement = Bytes::from_static(b"replacement");

        assert!(store.put_if_absent("claimed", original.clone()).await.unwrap());
        assert!(!store.put_if_absent("claimed", replacement).await.unwrap());

        let result = store.get("claimed").await.unwrap();
        assert_eq!(result, Some(original));
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let store = MemoryStore::new();
        let v1 = Bytes::from_static(b"v1");
        let v2 = Bytes::from_static(b"v2");
        let v3 = Bytes::from_static(b"v3");

        // Absent key: only a None expectation succeeds.
        assert!(!store
            .compare_and_swap("key", Some(v1.clone()), v2.clone())
            .await
            .unwrap());
        assert!(store
            .compare_and_swap("key", None, v1.clone())
            .await
            .unwrap());

        // Present key: expectation must match the stored value.
        assert!(!store
            .compare_and_swap("key", Some(v2.clone()), v3.clone())
            .await
            .unwrap());
        assert!(store.compare_and_swap("key", Some(v1), v2.clone()).await.unwrap());

        let result = store.get("key").await.unwrap();
        assert_eq!(result, Some(v2));
    }

    #[tokio::test]
    async fn test_scope() {
        let store = MemoryStore::new();
        let scoped_store = Store1::scope(&store, "scope".to_string());

        let key = "test_key".to_string();
        let value = Bytes::from_static(b"test_value");

        scoped_store.put(key.clone(), value.clone()).await.unwrap();
        let result = scoped_store.get(key.clone()).await.unwrap();

        assert_eq!(result, Some(value));

        // Ensure the value is not accessible without the scope
        let result_without_scope = store.get(key).await.unwrap();
        assert_eq!(result_without_scope, None);
    }

    #[tokio::test]
    async fn test_scopes_share_data() {
        let store = MemoryStore::new();
        let first = Store1::scope(&store, "posts".to_string());
        let second = Store1::scope(&store, "posts".to_string());

        let value = Bytes::from_static(b"test_value");
        first.put("key", value.clone()).await.unwrap();

        let result = second.get("key").await.unwrap();
        assert_eq!(result, Some(value));
    }

    #[tokio::test]
    async fn test_scoped_keys_are_unprefixed() {
        let store = MemoryStore::new();
        let scoped_store = Store1::scope(&store, "scope".to_string());
        let sibling = Store1::scope(&store, "other".to_string());

        scoped_store
            .put("a", Bytes::from_static(b"1"))
            .await
            .unwrap();
        scoped_store
            .put("b", Bytes::from_static(b"2"))
            .await
            .unwrap();
        sibling.put("c", Bytes::from_static(b"3")).await.unwrap();

        let mut keys = scoped_store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_nested_scope() {
        let store = MemoryStore::new();
        let partial_scoped_store = Store1::scope(&store, "scope1".to_string());
        let scoped_store = Store1::scope(&partial_scoped_store, "scope2".to_string());

        let key = "test_key".to_string();
        let value = Bytes::from_static(b"test_value");

        scoped_store.put(key.clone(), value.clone()).await.unwrap();
        let result = scoped_store.get(key.clone()).await.unwrap();

        assert_eq!(result, Some(value));

        // Ensure the value is not accessible without the nested scope
        let result_without_scope = store.get(key.clone()).await.unwrap();
        assert_eq!(result_without_scope, None);

        let result_with_partial_scope = partial_scoped_store.get(key).await.unwrap();
        assert_eq!(result_with_partial_scope, None);
    }
}
