//! libSQL backend: async `DocumentStore` implementation.
//!
//! Documents are JSON text rows in a single `documents` table keyed by
//! `(collection, id)`. Supports local file, in-memory, and remote databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::StoreLocation;
use crate::error::PersistenceError;
use crate::store::migrations;
use crate::store::traits::{Document, DocumentEntry, DocumentStore};

/// libSQL document store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open whichever store the configuration points at.
    pub async fn open(location: &StoreLocation) -> Result<Self, PersistenceError> {
        match location {
            StoreLocation::Local(path) => Self::new_local(path).await,
            StoreLocation::Remote { url, token } => Self::new_remote(url, token).await,
        }
    }

    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, PersistenceError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PersistenceError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| PersistenceError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(path = %path.display(), "Document store opened");
        Ok(store)
    }

    /// Connect to a remote libSQL server.
    pub async fn new_remote(url: &str, token: &SecretString) -> Result<Self, PersistenceError> {
        let db = libsql::Builder::new_remote(url.to_string(), token.expose_secret().to_string())
            .build()
            .await
            .map_err(|e| PersistenceError::Pool(format!("Failed to connect to {url}: {e}")))?;

        let store = Self::from_database(db).await?;
        info!(url = %url, "Remote document store connected");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, PersistenceError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                PersistenceError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, PersistenceError> {
        let conn = db
            .connect()
            .map_err(|e| PersistenceError::Pool(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn parse_document(raw: &str) -> Result<Document, PersistenceError> {
    serde_json::from_str(raw).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

fn encode_document(document: &Document) -> Result<String, PersistenceError> {
    serde_json::to_string(document).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

#[async_trait]
impl DocumentStore for LibSqlStore {
    async fn get_record(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("get_record: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| PersistenceError::Query(format!("get_record: {e}")))?;
                Ok(Some(parse_document(&raw)?))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(PersistenceError::Query(format!("get_record: {e}"))),
        }
    }

    async fn set_record(
        &self,
        collection: &str,
        id: &str,
        document: &Document,
    ) -> Result<(), PersistenceError> {
        let now = Utc::now().to_rfc3339();
        let data = encode_document(document)?;

        self.conn()
            .execute(
                "INSERT INTO documents (collection, id, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT (collection, id) DO UPDATE SET data = ?3, updated_at = ?4",
                params![collection, id, data, now],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("set_record: {e}")))?;

        debug!(collection, id, "Document written");
        Ok(())
    }

    async fn list_records(&self, collection: &str) -> Result<Vec<DocumentEntry>, PersistenceError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, data FROM documents WHERE collection = ?1",
                params![collection],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("list_records: {e}")))?;

        let mut documents = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PersistenceError::Query(format!("list_records: {e}")))?
        {
            let id: String = row
                .get(0)
                .map_err(|e| PersistenceError::Query(format!("list_records: {e}")))?;
            let raw: String = row
                .get(1)
                .map_err(|e| PersistenceError::Query(format!("list_records: {e}")))?;
            documents.push(DocumentEntry {
                id,
                data: parse_document(&raw)?,
            });
        }
        Ok(documents)
    }

    async fn add_record(
        &self,
        collection: &str,
        document: &Document,
    ) -> Result<String, PersistenceError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let data = encode_document(document)?;

        self.conn()
            .execute(
                "INSERT INTO documents (collection, id, data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![collection, id.clone(), data, now],
            )
            .await
            .map_err(|e| PersistenceError::Query(format!("add_record: {e}")))?;

        debug!(collection, id = %id, "Document appended");
        Ok(id)
    }
}
