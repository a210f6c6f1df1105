//! In-memory `DocumentStore` for tests and local experiments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::PersistenceError;
use crate::store::traits::{Document, DocumentEntry, DocumentStore};

/// Document store held entirely in process memory.
///
/// Writes can be made to fail on demand with [`MemoryStore::fail_writes`]
/// to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<String, Document>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail (or succeed again with `false`).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    fn check_writable(&self, collection: &str) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::WriteRejected(format!(
                "writes to {collection} are disabled"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_record(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, PersistenceError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|c| c.get(id)).cloned())
    }

    async fn set_record(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), PersistenceError> {
        self.check_writable(collection)?;
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), document.clone());
        Ok(())
    }

    async fn list_records(&self, collection: &str) -> Result<Vec<DocumentEntry>, PersistenceError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, data)| DocumentEntry {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn add_record(
        &self,
        collection: &str,
        document: &Document,
    ) -> Result<String, PersistenceError> {
        self.check_writable(collection)?;
        let id = Uuid::new_v4().to_string();
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document.clone());
        Ok(id)
    }
}
