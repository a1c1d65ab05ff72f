//! Raw document store trait and backends.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Validate that a collection name is safe for use as a key prefix.
///
/// Names must be non-empty and must not contain the null byte (used
/// internally as the collection/id separator).
pub(crate) fn validate_collection(collection: &str) -> StorageResult<()> {
    if collection.is_empty() {
        return Err(StorageError::InvalidKey(
            "collection must not be empty".into(),
        ));
    }
    if collection.contains('\0') {
        return Err(StorageError::InvalidKey(
            "collection must not contain null bytes".into(),
        ));
    }
    Ok(())
}

/// Validate that a document id is safe for storage.
pub(crate) fn validate_id(id: &str) -> StorageResult<()> {
    if id.is_empty() {
        return Err(StorageError::InvalidKey("id must not be empty".into()));
    }
    if id.contains('\0') {
        return Err(StorageError::InvalidKey(
            "id must not contain null bytes".into(),
        ));
    }
    Ok(())
}

/// Storage backend for opaque documents.
///
/// Documents are byte blobs keyed by `(collection, id)`. Collections are
/// fully isolated from one another: ids only need to be unique within their
/// collection, and listing never crosses a collection boundary.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. Returns `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Insert or overwrite a document.
    async fn put(&self, collection: &str, id: &str, bytes: Vec<u8>) -> StorageResult<()>;

    /// Delete a document. Returns `true` if it existed.
    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool>;

    /// List all document ids in a collection.
    async fn list_ids(&self, collection: &str) -> StorageResult<Vec<String>>;
}

// ---------------------------------------------------------------------------
// In-memory backend (always available)
// ---------------------------------------------------------------------------

/// In-memory document store for tests and ephemeral deployments.
///
/// Documents live in a `HashMap` keyed by `"{collection}\0{id}"` and vanish
/// with the process.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryDocumentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn full_key(collection: &str, id: &str) -> String {
        format!("{collection}\0{id}")
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_collection(collection)?;
        validate_id(id)?;
        let documents = self
            .documents
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(documents.get(&Self::full_key(collection, id)).cloned())
    }

    async fn put(&self, collection: &str, id: &str, bytes: Vec<u8>) -> StorageResult<()> {
        validate_collection(collection)?;
        validate_id(id)?;
        let mut documents = self
            .documents
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        documents.insert(Self::full_key(collection, id), bytes);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        validate_collection(collection)?;
        validate_id(id)?;
        let mut documents = self
            .documents
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(documents.remove(&Self::full_key(collection, id)).is_some())
    }

    async fn list_ids(&self, collection: &str) -> StorageResult<Vec<String>> {
        validate_collection(collection)?;
        let documents = self
            .documents
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        let prefix = format!("{collection}\0");
        Ok(documents
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix).map(String::from))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// SurrealKV backend (behind `kv` feature)
// ---------------------------------------------------------------------------

/// Persistent document store backed by `SurrealKV`.
///
/// ACID-compliant embedded LSM-tree storage. Every operation runs inside a
/// transaction.
#[cfg(feature = "kv")]
pub struct SurrealKvStore {
    tree: surrealkv::Tree,
}

#[cfg(feature = "kv")]
impl std::fmt::Debug for SurrealKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealKvStore").finish_non_exhaustive()
    }
}

#[cfg(feature = "kv")]
fn map_kv_err(e: &surrealkv::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

/// Build the composite key `"{collection}\0{id}"` as bytes.
#[cfg(feature = "kv")]
fn composite_key(collection: &str, id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(collection.len().saturating_add(1).saturating_add(id.len()));
    buf.extend_from_slice(collection.as_bytes());
    buf.push(0);
    buf.extend_from_slice(id.as_bytes());
    buf
}

/// Start of the collection range (inclusive): `"{collection}\0"`.
#[cfg(feature = "kv")]
fn collection_range_start(collection: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(collection.len().saturating_add(1));
    buf.extend_from_slice(collection.as_bytes());
    buf.push(0);
    buf
}

/// End of the collection range (exclusive): `"{collection}\x01"`.
///
/// `\0` is the separator, so every key in the collection has the form
/// `"{collection}\0{id}"` and the range `["{collection}\0", "{collection}\x01")`
/// captures exactly the collection's keys.
#[cfg(feature = "kv")]
fn collection_range_end(collection: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(collection.len().saturating_add(1));
    buf.extend_from_slice(collection.as_bytes());
    buf.push(1);
    buf
}

#[cfg(feature = "kv")]
impl SurrealKvStore {
    /// Open a persistent store at the given directory path.
    ///
    /// Creates the directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the store cannot be opened.
    pub fn open(path: impl AsRef<std::path::Path>) -> StorageResult<Self> {
        let tree = surrealkv::TreeBuilder::new()
            .with_path(path.as_ref().to_path_buf())
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { tree })
    }

    /// Close the store, flushing pending writes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Internal`] if the flush fails.
    pub async fn close(&self) -> StorageResult<()> {
        self.tree
            .close()
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))
    }
}

#[cfg(feature = "kv")]
#[async_trait]
impl DocumentStore for SurrealKvStore {
    async fn get(&self, collection: &str, id: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_collection(collection)?;
        validate_id(id)?;
        let key = composite_key(collection, id);
        let tx = self
            .tree
            .begin_with_mode(surrealkv::Mode::ReadOnly)
            .map_err(|ref e| map_kv_err(e))?;
        tx.get(&key).map_err(|ref e| map_kv_err(e))
    }

    async fn put(&self, collection: &str, id: &str, bytes: Vec<u8>) -> StorageResult<()> {
        validate_collection(collection)?;
        validate_id(id)?;
        let key = composite_key(collection, id);
        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
        tx.set(&key, &bytes).map_err(|ref e| map_kv_err(e))?;
        tx.commit().await.map_err(|ref e| map_kv_err(e))
    }

    async fn delete(&self, collection: &str, id: &str) -> StorageResult<bool> {
        validate_collection(collection)?;
        validate_id(id)?;
        let key = composite_key(collection, id);
        let mut tx = self.tree.begin().map_err(|ref e| map_kv_err(e))?;
        let existed = tx.get(&key).map_err(|ref e| map_kv_err(e))?.is_some();
        if existed {
            tx.delete(&key).map_err(|ref e| map_kv_err(e))?;
            tx.commit().await.map_err(|ref e| map_kv_err(e))?;
        }
        Ok(existed)
    }

    async fn list_ids(&self, collection: &str) -> StorageResult<Vec<String>> {
        validate_collection(collection)?;
        let start = collection_range_start(collection);
        let end = collection_range_end(collection);
        let prefix_len = collection.len().saturating_add(1);

        let tx = self
            .tree
            .begin_with_mode(surrealkv::Mode::ReadOnly)
            .map_err(|ref e| map_kv_err(e))?;
        let mut iter = tx.range(&start, &end).map_err(|ref e| map_kv_err(e))?;
        iter.seek_first().map_err(|ref e| map_kv_err(e))?;

        let mut ids = Vec::new();
        while iter.valid() {
            let raw_key = iter.key();
            if raw_key.len() > prefix_len
                && let Ok(id) = std::str::from_utf8(&raw_key[prefix_len..])
            {
                ids.push(id.to_string());
            }
            iter.next().map_err(|ref e| map_kv_err(e))?;
        }
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
