//! Document storage interface.
//!
//! # Responsibilities
//! - Define the storage seam the request handler talks through
//! - Provide the in-memory implementation used by the binary and tests
//!
//! # Design Decisions
//! - Documents are keyed by (collection name, document key); a key is the
//!   canonical 24-hex id or a slug-id
//! - Boxed futures keep the trait object-safe so the server can hold an
//!   `Arc<dyn Storage>`
//! - Persistence semantics live behind this seam, outside this crate

use dashmap::DashMap;
use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Storage seam. Implementations must be safe for concurrent use.
pub trait Storage: Send + Sync {
    /// Fetch one document, `None` when absent.
    fn get<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, StorageError>>;

    /// All documents of a collection.
    fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Value>, StorageError>>;

    /// Store a new document under `key`.
    fn insert<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
        document: Value,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Replace an existing document, returning the previous one.
    fn replace<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
        document: Value,
    ) -> BoxFuture<'a, Result<Option<Value>, StorageError>>;

    /// Delete a document; `true` when something was removed.
    fn delete<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<bool, StorageError>>;
}

/// In-memory store over per-collection concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, DashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    fn get<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async move {
            Ok(self
                .collections
                .get(collection)
                .and_then(|docs| docs.get(key).map(|doc| doc.clone())))
        })
    }

    fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Value>, StorageError>> {
        Box::pin(async move {
            Ok(self
                .collections
                .get(collection)
                .map(|docs| docs.iter().map(|entry| entry.value().clone()).collect())
                .unwrap_or_default())
        })
    }

    fn insert<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
        document: Value,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            self.collections
                .entry(collection.to_string())
                .or_default()
                .insert(key.to_string(), document);
            Ok(())
        })
    }

    fn replace<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
        document: Value,
    ) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
        Box::pin(async move {
            Ok(self
                .collections
                .entry(collection.to_string())
                .or_default()
                .insert(key.to_string(), document))
        })
    }

    fn delete<'a>(
        &'a self,
        collection: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<bool, StorageError>> {
        Box::pin(async move {
            Ok(self
                .collections
                .get(collection)
                .and_then(|docs| docs.remove(key))
                .is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_get_replace_delete() {
        let store = MemoryStore::new();
        let doc = json!({"name": "ada"});

        store.insert("users", "ada", doc.clone()).await.unwrap();
        assert_eq!(store.get("users", "ada").await.unwrap(), Some(doc));

        let old = store
            .replace("users", "ada", json!({"name": "ada", "v": 2}))
            .await
            .unwrap();
        assert!(old.is_some());

        assert!(store.delete("users", "ada").await.unwrap());
        assert!(!store.delete("users", "ada").await.unwrap());
        assert_eq!(store.get("users", "ada").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.list("ghosts").await.unwrap().is_empty());
    }
}
