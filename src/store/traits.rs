//! `DocumentStore` trait: the single async interface for persistence.

use async_trait::async_trait;

use crate::error::PersistenceError;

/// A stored document. Always a JSON object.
pub type Document = serde_json::Value;

/// A document together with the id it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEntry {
    pub id: String,
    pub data: Document,
}

/// Backend-agnostic collection-of-documents store.
///
/// Collections are addressed by slash-separated paths, so a sub-collection
/// such as `businesses/u1/transactions` is just another collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document by id.
    async fn get_record(&self, collection: &str, id: &str)
    -> Result<Option<Document>, PersistenceError>;

    /// Upsert a document, replacing any previous content in full.
    async fn set_record(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), PersistenceError>;

    /// Every document in a collection. No ordering guarantee.
    async fn list_records(&self, collection: &str)
    -> Result<Vec<DocumentEntry>, PersistenceError>;

    /// Append a document under a store-generated id and return that id.
    async fn add_record(&self, collection: &str, document: &Document)
    -> Result<String, PersistenceError>;
}
