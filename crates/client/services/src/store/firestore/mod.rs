//! Firestore REST backend.

mod codec;

use std::sync::Arc;

use async_trait::async_trait;
use client_core::{RecordId, SessionContext};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::error::StoreError;
use super::traits::{Document, DocumentBackend, NewDocument};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};

/// Production Firestore endpoint.
pub const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Project and endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,

    /// `host:port` of a local Firestore emulator
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            emulator_host: None,
        }
    }

    pub fn with_emulator(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    /// Resource name of the default database's document root.
    pub fn documents_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    fn root(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{host}/v1"),
            None => FIRESTORE_URL.to_string(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}:{}", self.root(), self.documents_path(), method)
    }
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<RawDocument>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Value,
}

/// [`DocumentBackend`] speaking the Firestore v1 REST API.
///
/// Requests carry the signed-in user's id token so security rules apply.
pub struct FirestoreBackend {
    config: FirestoreConfig,
    transport: Arc<dyn HttpTransport>,
    session: SessionContext,
}

impl FirestoreBackend {
    pub fn new(
        config: FirestoreConfig,
        transport: Arc<dyn HttpTransport>,
        session: SessionContext,
    ) -> Self {
        Self {
            config,
            transport,
            session,
        }
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    async fn post(&self, method: &str, body: Value) -> Result<HttpResponse, StoreError> {
        let request =
            HttpRequest::new(self.config.endpoint(method), body).with_bearer(self.session.id_token());

        let response = self
            .transport
            .post_json(request)
            .await
            .map_err(|err| StoreError::Network(err.to_string()))?;

        if !response.is_success() {
            return Err(StoreError::Rejected {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DocumentBackend for FirestoreBackend {
    async fn insert(&self, collection: &str, document: NewDocument) -> Result<RecordId, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let name = format!("{}/{}/{}", self.config.documents_path(), collection, id);

        let mut write = json!({
            "update": {
                "name": name,
                "fields": codec::encode_fields(&document.fields),
            },
            "currentDocument": { "exists": false },
        });
        if let Some(field) = &document.server_timestamp {
            write["updateTransforms"] = json!([
                { "fieldPath": field, "setToServerValue": "REQUEST_TIME" }
            ]);
        }

        self.post("commit", json!({ "writes": [write] })).await?;

        tracing::debug!("Committed {}", name);
        Ok(RecordId::new(id))
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": field },
                        "op": "EQUAL",
                        "value": codec::encode_value(value),
                    }
                }
            }
        });

        let response = self.post("runQuery", query).await?;

        let rows: Vec<QueryRow> = serde_json::from_str(&response.body)
            .map_err(|err| StoreError::Decode(format!("runQuery on {collection}: {err}")))?;

        // Rows without a document only report read progress.
        rows.into_iter()
            .filter_map(|row| row.document)
            .map(decode_document)
            .collect()
    }
}

fn decode_document(raw: RawDocument) -> Result<Document, StoreError> {
    let id = raw
        .name
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();

    let fields = if raw.fields.is_null() {
        Map::new()
    } else {
        codec::decode_fields(&raw.fields).map_err(|reason| StoreError::Malformed {
            id: id.clone(),
            reason,
        })?
    };

    Ok(Document { id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use client_core::{AuthenticatedUser, SessionEvent, SessionHandler, UserId, session_channel};

    fn backend(transport: &MockTransport) -> (FirestoreBackend, SessionHandler) {
        let (_events, handler, ctx) = session_channel(4);
        let backend = FirestoreBackend::new(
            FirestoreConfig::new("riqa-dev"),
            Arc::new(transport.clone()),
            ctx,
        );
        (backend, handler)
    }

    fn simulation_document() -> NewDocument {
        let mut fields = Map::new();
        fields.insert("userId".into(), json!("alice"));
        fields.insert("payload".into(), json!({"mass": 10}));
        NewDocument {
            fields,
            server_timestamp: Some("createdAt".into()),
        }
    }

    #[tokio::test]
    async fn insert_commits_with_server_timestamp() {
        let transport = MockTransport::new().respond(200, json!({"writeResults": [{}]}));
        let (backend, handler) = backend(&transport);
        handler.apply(SessionEvent::SignedIn(AuthenticatedUser::new(
            UserId::new("alice"),
            "tok",
        )));

        let id = backend
            .insert("simulations", simulation_document())
            .await
            .unwrap();

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "https://firestore.googleapis.com/v1/projects/riqa-dev/databases/(default)/documents:commit"
        );
        assert_eq!(request.bearer.as_deref(), Some("tok"));

        let write = &request.body["writes"][0];
        assert_eq!(
            write["update"]["name"],
            format!(
                "projects/riqa-dev/databases/(default)/documents/simulations/{}",
                id
            )
        );
        assert_eq!(write["update"]["fields"]["userId"], json!({"stringValue": "alice"}));
        assert!(write["update"]["fields"].get("createdAt").is_none());
        assert_eq!(write["currentDocument"]["exists"], false);
        assert_eq!(
            write["updateTransforms"][0],
            json!({"fieldPath": "createdAt", "setToServerValue": "REQUEST_TIME"})
        );
    }

    #[tokio::test]
    async fn query_filters_on_field_and_decodes_rows() {
        let transport = MockTransport::new().respond(
            200,
            json!([
                {"readTime": "2024-05-01T12:00:00Z"},
                {"document": {
                    "name": "projects/riqa-dev/databases/(default)/documents/simulations/abc",
                    "fields": {
                        "userId": {"stringValue": "alice"},
                        "payload": {"mapValue": {"fields": {"mass": {"integerValue": "10"}}}},
                        "createdAt": {"timestampValue": "2024-05-01T12:00:00Z"}
                    }
                }}
            ]),
        );
        let (backend, _handler) = backend(&transport);

        let documents = backend
            .query_eq("simulations", "userId", &json!("alice"))
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].id, "abc");
        assert_eq!(documents[0].fields["payload"], json!({"mass": 10}));

        let request = &transport.requests()[0];
        assert!(request.url.ends_with("documents:runQuery"));
        assert_eq!(request.bearer, None);
        let filter = &request.body["structuredQuery"]["where"]["fieldFilter"];
        assert_eq!(filter["field"]["fieldPath"], "userId");
        assert_eq!(filter["op"], "EQUAL");
        assert_eq!(filter["value"], json!({"stringValue": "alice"}));
    }

    #[tokio::test]
    async fn permission_denied_is_rejected() {
        let transport = MockTransport::new().respond_raw(403, "PERMISSION_DENIED");
        let (backend, _handler) = backend(&transport);

        let err = backend
            .insert("simulations", simulation_document())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Rejected { status: 403, .. }));
    }

    #[tokio::test]
    async fn transport_failure_is_network_error() {
        let transport = MockTransport::new().fail("connection reset");
        let (backend, _handler) = backend(&transport);

        let err = backend
            .query_eq("simulations", "userId", &json!("alice"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Network(_)));
    }

    #[tokio::test]
    async fn unparseable_query_response_is_decode_error() {
        let transport = MockTransport::new().respond_raw(200, "<html>gateway</html>");
        let (backend, _handler) = backend(&transport);

        let err = backend
            .query_eq("simulations", "userId", &json!("alice"))
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Decode(ref reason) if reason.contains("simulations")));
    }

    #[test]
    fn emulator_endpoint() {
        let config = FirestoreConfig::new("demo").with_emulator("localhost:8080");
        assert_eq!(
            config.endpoint("commit"),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents:commit"
        );
    }
}
