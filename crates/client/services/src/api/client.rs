//! Backend REST client.

use std::sync::Arc;

use client_core::SessionContext;
use serde_json::{Value, json};

use super::error::ApiError;
use crate::http::{HttpRequest, HttpTransport};

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Endpoints exposed by the simulation backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Simulate,
    Quantum,
    Generate,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Simulate => "/simulate",
            Endpoint::Quantum => "/quantum",
            Endpoint::Generate => "/generate",
        }
    }
}

/// Successful backend response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,

    /// Response body exactly as the backend sent it; `null` when empty
    pub body: Value,
}

/// Stateless REST client bound to one base URL.
///
/// Calls suspend until the backend answers or the transport gives up. There
/// is no retry and no timeout layered on top of the transport.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    session: SessionContext,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        session: SessionContext,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST` `body` to `endpoint` (relative to the base URL).
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] for non-2xx answers, with status and body
    /// - [`ApiError::Network`] when no answer arrived
    /// - [`ApiError::Decode`] when a 2xx body is not JSON
    pub async fn submit(&self, endpoint: &str, body: Value) -> Result<ApiResponse, ApiError> {
        let url = self.url_for(endpoint)?;

        // The backend authenticates with bearer tokens; anonymous calls go out bare.
        let request = HttpRequest::new(url, body).with_bearer(self.session.id_token());
        let response = self.transport.post_json(request).await?;

        if !response.is_success() {
            tracing::warn!(
                "Backend call {} failed with status {}",
                endpoint,
                response.status
            );
            return Err(ApiError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let body = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body).map_err(|err| ApiError::Decode(err.to_string()))?
        };

        Ok(ApiResponse {
            status: response.status,
            body,
        })
    }

    pub async fn call(&self, endpoint: Endpoint, body: Value) -> Result<ApiResponse, ApiError> {
        self.submit(endpoint.path(), body).await
    }

    pub async fn run_simulation(&self, params: Value) -> Result<ApiResponse, ApiError> {
        self.call(Endpoint::Simulate, params).await
    }

    pub async fn run_quantum_analysis(&self, params: Value) -> Result<ApiResponse, ApiError> {
        self.call(Endpoint::Quantum, params).await
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<ApiResponse, ApiError> {
        self.call(Endpoint::Generate, json!({ "prompt": prompt })).await
    }

    fn url_for(&self, endpoint: &str) -> Result<String, ApiError> {
        let path = endpoint.trim().trim_start_matches('/');
        if path.is_empty() || path.contains("://") {
            return Err(ApiError::InvalidEndpoint(endpoint.to_string()));
        }
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
    }
}
