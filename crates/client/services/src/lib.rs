//! Backend-facing services for the RIQA client.
//!
//! # Architecture
//!
//! ```text
//! ApiClient ─────┐
//! FirebaseAuth ──┼──▶ HttpTransport (reqwest, or a mock in tests)
//! Firestore ─────┘
//!
//! RealtimeChannel ──▶ RealtimeConnector (tokio-tungstenite)
//! SimulationStore ──▶ DocumentBackend (Firestore REST, in-memory)
//! ```
//!
//! Every service that acts for a user reads the caller's identity from a
//! [`client_core::SessionContext`] handed to its constructor; none of them
//! keeps session state of its own.
pub mod api;
pub mod auth;
pub mod http;
pub mod realtime;
pub mod store;

#[cfg(test)]
pub mod mock;

pub use api::{ApiClient, ApiError, ApiResponse, DEFAULT_API_URL, Endpoint};
pub use auth::{AuthProviderError, FirebaseAuth, FirebaseAuthConfig};
pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};
pub use realtime::{
    ChannelError, ConnectionState, EventStream, RealtimeChannel, RealtimeConnector, WsConnector,
};
pub use store::{
    Document, DocumentBackend, FIRESTORE_URL, FirestoreBackend, FirestoreConfig,
    InMemoryDocumentStore, NewDocument, SIMULATIONS_COLLECTION, SimulationStore, StoreError,
};

#[cfg(test)]
pub use mock::MockTransport;
