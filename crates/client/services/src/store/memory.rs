//! In-memory document backend for tests and offline runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use client_core::RecordId;
use serde_json::Value;
use uuid::Uuid;

use super::error::StoreError;
use super::traits::{Document, DocumentBackend, NewDocument};

/// Process-local document store.
///
/// Ids are random UUIDs and server timestamps use the local clock.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> Result<usize, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections.get(collection).map_or(0, Vec::len))
    }
}

#[async_trait]
impl DocumentBackend for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, document: NewDocument) -> Result<RecordId, StoreError> {
        let id = Uuid::new_v4().simple().to_string();

        let mut fields = document.fields;
        if let Some(field) = document.server_timestamp {
            fields.insert(field, Value::String(Utc::now().to_rfc3339()));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::LockPoisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });

        Ok(RecordId::new(id))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned)?;

        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|document| document.fields.get(field) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
