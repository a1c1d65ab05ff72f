//! Typed JSON collections over a [`DocumentStore`].

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StorageError, StorageResult};
use crate::store::{DocumentStore, validate_collection};

/// A typed view into one collection of a [`DocumentStore`].
///
/// Values are JSON-encoded on write and decoded on read. Cloning a
/// `Collection` creates a new handle to the same underlying store.
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a typed view into `name` on the given store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the collection name is empty
    /// or contains null bytes.
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>) -> StorageResult<Self> {
        let name = name.into();
        validate_collection(&name)?;
        Ok(Self {
            store,
            name,
            _marker: PhantomData,
        })
    }

    /// The collection name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch and decode a document. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the stored bytes do not
    /// decode as `T`, or any underlying store error.
    pub async fn get(&self, id: &str) -> StorageResult<Option<T>> {
        let bytes = self.store.get(&self.name, id).await?;
        bytes
            .map(|b| {
                serde_json::from_slice(&b).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .transpose()
    }

    /// Encode and store a document, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if encoding fails, or any
    /// underlying store error.
    pub async fn put(&self, id: &str, value: &T) -> StorageResult<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.put(&self.name, id, bytes).await
    }

    /// Delete a document. Returns `true` if it existed.
    ///
    /// # Errors
    ///
    /// Returns any underlying store error.
    pub async fn delete(&self, id: &str) -> StorageResult<bool> {
        self.store.delete(&self.name, id).await
    }

    /// List all document ids in this collection.
    ///
    /// # Errors
    ///
    /// Returns any underlying store error.
    pub async fn ids(&self) -> StorageResult<Vec<String>> {
        self.store.list_ids(&self.name).await
    }

    /// Fetch and decode every document in this collection.
    ///
    /// Documents deleted between the id listing and the reads are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if any document fails to
    /// decode, or any underlying store error.
    pub async fn all(&self) -> StorageResult<Vec<T>> {
        let ids = self.ids().await?;
        let mut values = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(value) = self.get(&id).await? {
                values.push(value);
            }
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    fn collection() -> Collection<Record> {
        let store = Arc::new(MemoryDocumentStore::new());
        Collection::new(store, "records").unwrap()
    }

    #[tokio::test]
    async fn round_trip() {
        let records = collection();
        let value = Record {
            name: "demo".into(),
            count: 3,
        };
        records.put("a", &value).await.unwrap();
        assert_eq!(records.get("a").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn missing_returns_none() {
        let records = collection();
        assert!(records.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn all_returns_every_document() {
        let records = collection();
        for i in 0..3u32 {
            let value = Record {
                name: format!("r{i}"),
                count: i,
            };
            records.put(&format!("id-{i}"), &value).await.unwrap();
        }
        let mut all = records.all().await.unwrap();
        all.sort_by(|a, b| a.count.cmp(&b.count));
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "r0");
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let records = collection();
        let value = Record {
            name: "demo".into(),
            count: 0,
        };
        records.put("a", &value).await.unwrap();
        assert!(records.delete("a").await.unwrap());
        assert!(records.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_document_surfaces_serialization_error() {
        let store = Arc::new(MemoryDocumentStore::new());
        store
            .put("records", "bad", b"not json".to_vec())
            .await
            .unwrap();
        let records: Collection<Record> =
            Collection::new(Arc::clone(&store) as Arc<dyn DocumentStore>, "records").unwrap();
        assert!(matches!(
            records.get("bad").await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn rejects_empty_collection_name() {
        let store = Arc::new(MemoryDocumentStore::new());
        let result: StorageResult<Collection<Record>> = Collection::new(store, "");
        assert!(result.is_err());
    }
}
