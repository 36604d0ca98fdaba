//! Errors surfaced by the API client.

use thiserror::Error;

use crate::http::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error(transparent)]
    Network(#[from] TransportError),

    #[error("backend response is not valid JSON: {0}")]
    Decode(String),

    #[error("invalid endpoint: {0:?}")]
    InvalidEndpoint(String),
}

impl ApiError {
    /// HTTP status, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
