//! Error types raised by document backends and the store adapter.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store lock was poisoned")]
    LockPoisoned,

    #[error("document store unreachable: {0}")]
    Network(String),

    #[error("document store rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unreadable document store response: {0}")]
    Decode(String),

    #[error("malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("failed to {operation} in collection {collection}")]
    Operation {
        operation: &'static str,
        collection: String,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Wrap a backend error with the adapter operation that hit it.
    pub fn during(self, operation: &'static str, collection: &str) -> Self {
        StoreError::Operation {
            operation,
            collection: collection.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, past any operation context.
    pub fn root(&self) -> &StoreError {
        match self {
            StoreError::Operation { source, .. } => source.root(),
            other => other,
        }
    }
}
