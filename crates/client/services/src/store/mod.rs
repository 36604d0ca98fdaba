//! Simulation record persistence.
//!
//! [`SimulationStore`] is the adapter views talk to. It maps records onto a
//! schema-less [`DocumentBackend`]:
//! - [`InMemoryDocumentStore`] for tests and offline runs
//! - [`FirestoreBackend`] for the Firestore REST API (or its emulator)
mod adapter;
mod error;
mod firestore;
mod memory;
mod traits;

pub use adapter::{SIMULATIONS_COLLECTION, SimulationStore};
pub use error::StoreError;
pub use firestore::{FIRESTORE_URL, FirestoreBackend, FirestoreConfig};
pub use memory::InMemoryDocumentStore;
pub use traits::{Document, DocumentBackend, NewDocument};
