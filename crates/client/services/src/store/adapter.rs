//! Owner-scoped simulation records on top of a document backend.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use client_core::{NewSimulation, RecordId, SimulationRecord, UserId};
use serde_json::{Map, Value};

use super::error::StoreError;
use super::traits::{Document, DocumentBackend, NewDocument};

/// Collection holding simulation records.
pub const SIMULATIONS_COLLECTION: &str = "simulations";

const OWNER_FIELD: &str = "userId";
const PAYLOAD_FIELD: &str = "payload";
const CREATED_AT_FIELD: &str = "createdAt";

/// Persists and queries [`SimulationRecord`]s.
///
/// Records are append-only: this adapter only inserts and reads.
#[derive(Clone)]
pub struct SimulationStore {
    backend: Arc<dyn DocumentBackend>,
    collection: String,
}

impl SimulationStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self::with_collection(backend, SIMULATIONS_COLLECTION)
    }

    pub fn with_collection(backend: Arc<dyn DocumentBackend>, collection: impl Into<String>) -> Self {
        Self {
            backend,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Save a new record; the creation time is always stamped by the backend.
    pub async fn save(&self, record: NewSimulation) -> Result<RecordId, StoreError> {
        if let Some(supplied) = record.created_at {
            tracing::debug!("Ignoring caller createdAt {} in favour of server time", supplied);
        }

        let mut fields = Map::new();
        fields.insert(OWNER_FIELD.to_string(), Value::String(record.owner_id.0.clone()));
        fields.insert(PAYLOAD_FIELD.to_string(), record.payload);

        let document = NewDocument {
            fields,
            server_timestamp: Some(CREATED_AT_FIELD.to_string()),
        };

        let id = self
            .backend
            .insert(&self.collection, document)
            .await
            .map_err(|err| err.during("save record", &self.collection))?;

        tracing::info!("Saved simulation {} for {}", id, record.owner_id);
        Ok(id)
    }

    /// All records owned by `owner`, unordered.
    pub async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<SimulationRecord>, StoreError> {
        let documents = self
            .backend
            .query_eq(&self.collection, OWNER_FIELD, &Value::String(owner.0.clone()))
            .await
            .map_err(|err| err.during("query records", &self.collection))?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            // Foreign documents are dropped before decoding so they cannot fail the query.
            let document_owner = document.fields.get(OWNER_FIELD).and_then(Value::as_str);
            if document_owner != Some(owner.as_str()) {
                tracing::warn!(
                    "Backend returned record {} owned by {:?} for owner query {}",
                    document.id,
                    document_owner,
                    owner
                );
                continue;
            }
            records.push(decode_record(document)?);
        }

        tracing::debug!("Found {} simulations for {}", records.len(), owner);
        Ok(records)
    }
}

fn decode_record(mut document: Document) -> Result<SimulationRecord, StoreError> {
    let malformed = |id: &str, reason: &str| StoreError::Malformed {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    let owner_id = document
        .fields
        .get(OWNER_FIELD)
        .and_then(Value::as_str)
        .map(UserId::new)
        .ok_or_else(|| malformed(&document.id, "missing userId"))?;

    let created_at = document
        .fields
        .get(CREATED_AT_FIELD)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| malformed(&document.id, "missing or invalid createdAt"))?;

    let payload = document.fields.remove(PAYLOAD_FIELD).unwrap_or(Value::Null);

    Ok(SimulationRecord {
        id: RecordId::new(document.id),
        owner_id,
        payload,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryDocumentStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    fn store() -> (SimulationStore, Arc<InMemoryDocumentStore>) {
        let backend = Arc::new(InMemoryDocumentStore::new());
        (SimulationStore::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn save_overrides_caller_timestamp() {
        let (store, _) = store();
        let owner = UserId::new("alice");
        let stale = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let before = Utc::now();

        let id = store
            .save(NewSimulation::new(owner.clone(), json!({"mass": 10})).with_created_at(stale))
            .await
            .unwrap();

        let records = store.find_by_owner(&owner).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_ne!(records[0].created_at, stale);
        assert!(records[0].created_at >= before);
        assert_eq!(records[0].payload, json!({"mass": 10}));
    }

    #[tokio::test]
    async fn find_by_owner_is_scoped() {
        let (store, _) = store();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        store.save(NewSimulation::new(alice.clone(), json!(1))).await.unwrap();
        store.save(NewSimulation::new(bob.clone(), json!(2))).await.unwrap();
        store.save(NewSimulation::new(alice.clone(), json!(3))).await.unwrap();

        let records = store.find_by_owner(&alice).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record.owner_id == alice));

        let none = store.find_by_owner(&UserId::new("carol")).await.unwrap();
        assert!(none.is_empty());
    }

    /// Backend that ignores the filter and returns everything it has.
    struct LeakyBackend {
        documents: Vec<Document>,
    }

    #[async_trait]
    impl DocumentBackend for LeakyBackend {
        async fn insert(&self, _: &str, _: NewDocument) -> Result<RecordId, StoreError> {
            Err(StoreError::Rejected {
                status: 403,
                body: "PERMISSION_DENIED".into(),
            })
        }

        async fn query_eq(&self, _: &str, _: &str, _: &Value) -> Result<Vec<Document>, StoreError> {
            Ok(self.documents.clone())
        }
    }

    fn document(id: &str, owner: &str) -> Document {
        let mut fields = Map::new();
        fields.insert(OWNER_FIELD.into(), json!(owner));
        fields.insert(CREATED_AT_FIELD.into(), json!("2024-05-01T12:00:00Z"));
        fields.insert(PAYLOAD_FIELD.into(), json!({"id": id}));
        Document {
            id: id.into(),
            fields,
        }
    }

    #[tokio::test]
    async fn foreign_records_are_never_returned() {
        let backend = LeakyBackend {
            documents: vec![document("a1", "alice"), document("b1", "bob")],
        };
        let store = SimulationStore::new(Arc::new(backend));

        let records = store.find_by_owner(&UserId::new("alice")).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId::new("a1"));
    }

    #[tokio::test]
    async fn malformed_foreign_records_do_not_fail_the_query() {
        let mut foreign = document("b1", "bob");
        foreign.fields.insert(CREATED_AT_FIELD.into(), json!("garbage"));
        let mut ownerless = document("x1", "alice");
        ownerless.fields.remove(OWNER_FIELD);
        let backend = LeakyBackend {
            documents: vec![document("a1", "alice"), foreign, ownerless],
        };
        let store = SimulationStore::new(Arc::new(backend));

        let records = store.find_by_owner(&UserId::new("alice")).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, RecordId::new("a1"));
    }

    #[tokio::test]
    async fn backend_errors_are_wrapped_not_swallowed() {
        let store = SimulationStore::new(Arc::new(LeakyBackend { documents: vec![] }));

        let err = store
            .save(NewSimulation::new(UserId::new("alice"), json!({})))
            .await
            .unwrap_err();

        match &err {
            StoreError::Operation {
                operation,
                collection,
                ..
            } => {
                assert_eq!(*operation, "save record");
                assert_eq!(collection, SIMULATIONS_COLLECTION);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root(), StoreError::Rejected { status: 403, .. }));
    }

    #[tokio::test]
    async fn undecodable_documents_are_reported() {
        let mut broken = document("x1", "alice");
        broken.fields.insert(CREATED_AT_FIELD.into(), json!("yesterday"));
        let store = SimulationStore::new(Arc::new(LeakyBackend {
            documents: vec![broken],
        }));

        let err = store.find_by_owner(&UserId::new("alice")).await.unwrap_err();

        assert!(matches!(err, StoreError::Malformed { ref id, .. } if id == "x1"));
    }
}
