//! Backend contract for schema-less document collections.

use async_trait::async_trait;
use client_core::RecordId;
use serde_json::{Map, Value};

use super::error::StoreError;

/// A document to insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewDocument {
    pub fields: Map<String, Value>,

    /// Field the backend fills with its own clock at write time
    pub server_timestamp: Option<String>,
}

/// A stored document. Timestamps are RFC 3339 strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Remote (or in-memory) document database.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Insert a document and return the id the backend assigned.
    async fn insert(&self, collection: &str, document: NewDocument) -> Result<RecordId, StoreError>;

    /// All documents whose `field` equals `value`, in no particular order.
    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;
}
