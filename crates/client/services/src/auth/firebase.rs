//! Email/password authentication over the Identity Toolkit REST API.

use std::sync::Arc;

use chrono::{Duration, Utc};
use client_core::{AuthenticatedUser, SessionEvent, SessionEvents, UserId};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::http::{HttpRequest, HttpTransport, TransportError};

/// Production Identity Toolkit endpoint.
pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthProviderError {
    #[error("auth provider rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Network(#[from] TransportError),

    #[error("unexpected auth provider response: {0}")]
    Decode(String),

    #[error("session handler is not running")]
    SessionClosed,
}

/// Connection settings for the Identity Toolkit API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseAuthConfig {
    pub api_key: String,

    /// `host:port` of a local Auth emulator
    pub emulator_host: Option<String>,
}

impl FirebaseAuthConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            emulator_host: None,
        }
    }

    pub fn with_emulator(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn endpoint(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{host}/identitytoolkit.googleapis.com/v1"),
            None => IDENTITY_TOOLKIT_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Firebase authentication provider.
///
/// Every outcome is reported to the session handler: success as
/// [`SessionEvent::SignedIn`], failure as [`SessionEvent::ProviderError`]
/// so the session falls back to anonymous.
#[derive(Clone)]
pub struct FirebaseAuth {
    config: FirebaseAuthConfig,
    transport: Arc<dyn HttpTransport>,
    events: SessionEvents,
}

impl FirebaseAuth {
    pub fn new(
        config: FirebaseAuthConfig,
        transport: Arc<dyn HttpTransport>,
        events: SessionEvents,
    ) -> Self {
        Self {
            config,
            transport,
            events,
        }
    }

    pub fn config(&self) -> &FirebaseAuthConfig {
        &self.config
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthProviderError> {
        self.exchange("accounts:signInWithPassword", email, password).await
    }

    /// Create an account and sign it in.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthProviderError> {
        self.exchange("accounts:signUp", email, password).await
    }

    pub async fn sign_out(&self) -> Result<(), AuthProviderError> {
        if !self.events.emit(SessionEvent::SignedOut).await {
            return Err(AuthProviderError::SessionClosed);
        }
        Ok(())
    }

    async fn exchange(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<UserId, AuthProviderError> {
        match self.request_token(method, email, password).await {
            Ok(user) => {
                let user_id = user.user_id.clone();
                if !self.events.emit(SessionEvent::SignedIn(user)).await {
                    return Err(AuthProviderError::SessionClosed);
                }
                Ok(user_id)
            }
            Err(err) => {
                tracing::warn!("Firebase {} failed: {}", method, err);
                self.events.emit(SessionEvent::ProviderError(err.to_string())).await;
                Err(err)
            }
        }
    }

    async fn request_token(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, AuthProviderError> {
        let url = format!(
            "{}/{}?key={}",
            self.config.endpoint(),
            method,
            self.config.api_key
        );
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response = self.transport.post_json(HttpRequest::new(url, body)).await?;

        if !response.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&response.body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(response.body);
            return Err(AuthProviderError::Rejected {
                status: response.status,
                message,
            });
        }

        let token: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|err| AuthProviderError::Decode(err.to_string()))?;

        let mut user = AuthenticatedUser::new(UserId::new(token.local_id), token.id_token);
        if let Some(seconds) = token.expires_in.and_then(|s| s.parse::<i64>().ok()) {
            user = user.with_expiry(Utc::now() + Duration::seconds(seconds));
        }

        Ok(user)
    }
}
