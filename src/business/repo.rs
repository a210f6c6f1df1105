//! Typed access to business documents in the store.

use tracing::warn;

use crate::error::PersistenceError;
use crate::store::{DocumentEntry, DocumentStore};

use super::model::{BUSINESSES, BusinessRecord};

/// Load the business record for an identity, if onboarding has completed.
pub async fn load_business(
    store: &dyn DocumentStore,
    identity: &str,
) -> Result<Option<BusinessRecord>, PersistenceError> {
    match store.get_record(BUSINESSES, identity).await? {
        Some(doc) => BusinessRecord::from_document(doc)
            .map(Some)
            .map_err(|e| PersistenceError::Serialization(format!("business {identity}: {e}"))),
        None => Ok(None),
    }
}

/// Write (or overwrite) the business record under its identity.
pub async fn save_business(
    store: &dyn DocumentStore,
    record: &BusinessRecord,
) -> Result<(), PersistenceError> {
    let doc = record
        .to_document()
        .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
    store.set_record(BUSINESSES, &record.identity, &doc).await
}

/// Every decodable business record. Undecodable documents are skipped.
pub async fn list_businesses(
    store: &dyn DocumentStore,
) -> Result<Vec<BusinessRecord>, PersistenceError> {
    let entries = store.list_records(BUSINESSES).await?;
    Ok(decode_all(entries))
}

fn decode_all(entries: Vec<DocumentEntry>) -> Vec<BusinessRecord> {
    entries
        .into_iter()
        .filter_map(|entry| match BusinessRecord::from_document(entry.data) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(id = %entry.id, error = %e, "Skipping undecodable business document");
                None
            }
        })
        .collect()
}
