//! Session state owned by a single handler and fed by auth events.
//!
//! The authentication provider never touches session state directly. It
//! sends [`SessionEvent`]s through [`SessionEvents`]; one [`SessionHandler`]
//! applies them in arrival order and publishes snapshots that any number of
//! [`SessionContext`] readers observe synchronously.
//!
//! ```text
//! AuthProvider ──SessionEvent──▶ SessionHandler ──watch──▶ SessionContext (guard, api, store)
//! ```
//!
//! The session starts anonymous and falls back to anonymous on provider
//! errors, so an unreachable provider can never leave the client signed in.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};

use crate::record::UserId;

/// Identity and credentials of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,

    /// Bearer token presented to the backend and the document store
    pub id_token: String,

    /// Token expiry; `None` means the provider did not report one
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthenticatedUser {
    pub fn new(user_id: UserId, id_token: impl Into<String>) -> Self {
        Self {
            user_id,
            id_token: id_token.into(),
            expires_at: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expiry| now < expiry)
    }
}

/// Snapshot of the current authentication context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<AuthenticatedUser>,
}

impl Session {
    pub const fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn authenticated(user: AuthenticatedUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// An expired token counts as signed out.
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_valid_at(now))
    }

    pub fn current_user_id(&self) -> Option<&UserId> {
        self.valid_user().map(|user| &user.user_id)
    }

    pub fn id_token(&self) -> Option<&str> {
        self.valid_user().map(|user| user.id_token.as_str())
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    fn valid_user(&self) -> Option<&AuthenticatedUser> {
        self.user
            .as_ref()
            .filter(|user| user.is_valid_at(Utc::now()))
    }
}

/// Authentication state change reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(AuthenticatedUser),
    SignedOut,
    /// Provider failed or became unreachable; the session fails closed.
    ProviderError(String),
}

/// Creates the event sender, the single-owner handler, and a read view.
pub fn session_channel(buffer: usize) -> (SessionEvents, SessionHandler, SessionContext) {
    let (event_tx, event_rx) = mpsc::channel(buffer.max(1));
    let (state_tx, state_rx) = watch::channel(Session::anonymous());

    (
        SessionEvents { tx: event_tx },
        SessionHandler {
            events: event_rx,
            state: state_tx,
        },
        SessionContext { state: state_rx },
    )
}

/// Cloneable sender used by the authentication provider.
#[derive(Clone, Debug)]
pub struct SessionEvents {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Deliver an event to the session handler.
    ///
    /// Returns `false` if the handler has already shut down.
    pub async fn emit(&self, event: SessionEvent) -> bool {
        if self.tx.send(event).await.is_err() {
            tracing::warn!("Session handler is gone, dropping auth event");
            return false;
        }
        true
    }
}

/// Sole owner of session state.
pub struct SessionHandler {
    events: mpsc::Receiver<SessionEvent>,
    state: watch::Sender<Session>,
}

impl SessionHandler {
    /// Apply events until every [`SessionEvents`] sender is dropped.
    pub async fn run(mut self) {
        tracing::debug!("Session handler started");

        while let Some(event) = self.events.recv().await {
            self.apply(event);
        }

        self.state.send_replace(Session::anonymous());
        tracing::debug!("Session handler stopped");
    }

    /// Apply a single event and publish the resulting snapshot.
    pub fn apply(&self, event: SessionEvent) {
        let next = match event {
            SessionEvent::SignedIn(user) => {
                tracing::info!("Signed in as {}", user.user_id);
                Session::authenticated(user)
            }
            SessionEvent::SignedOut => {
                tracing::info!("Signed out");
                Session::anonymous()
            }
            SessionEvent::ProviderError(reason) => {
                tracing::warn!("Auth provider error, session reset: {}", reason);
                Session::anonymous()
            }
        };

        self.state.send_replace(next);
    }

    /// Read view bound to this handler.
    pub fn context(&self) -> SessionContext {
        SessionContext {
            state: self.state.subscribe(),
        }
    }
}

/// Synchronous, cloneable read view of the session.
#[derive(Clone, Debug)]
pub struct SessionContext {
    state: watch::Receiver<Session>,
}

impl SessionContext {
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn current_user_id(&self) -> Option<UserId> {
        self.state.borrow().current_user_id().cloned()
    }

    pub fn id_token(&self) -> Option<String> {
        self.state.borrow().id_token().map(str::to_owned)
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Current snapshot, marked as seen so that [`changed`](Self::changed)
    /// only wakes for later updates.
    pub fn observe(&mut self) -> Session {
        self.state.borrow_and_update().clone()
    }

    /// Wait until the handler publishes a new snapshot.
    ///
    /// Returns `false` once the handler has stopped.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn alice() -> AuthenticatedUser {
        AuthenticatedUser::new(UserId::new("alice"), "token-a")
    }

    #[test]
    fn starts_anonymous() {
        let (_events, _handler, ctx) = session_channel(4);
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.current_user_id(), None);
        assert_eq!(ctx.id_token(), None);
    }

    #[test]
    fn sign_in_then_sign_out() {
        let (_events, handler, ctx) = session_channel(4);

        handler.apply(SessionEvent::SignedIn(alice()));
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.current_user_id(), Some(UserId::new("alice")));
        assert_eq!(ctx.id_token().as_deref(), Some("token-a"));

        handler.apply(SessionEvent::SignedOut);
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn provider_error_fails_closed() {
        let (_events, handler, ctx) = session_channel(4);
        handler.apply(SessionEvent::SignedIn(alice()));

        handler.apply(SessionEvent::ProviderError("unreachable".into()));

        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.current_user_id(), None);
    }

    #[test]
    fn expired_token_is_not_authenticated() {
        let now = Utc::now();
        let user = alice().with_expiry(now - Duration::seconds(1));
        let session = Session::authenticated(user.clone());

        assert!(!session.is_authenticated());
        assert_eq!(session.current_user_id(), None);
        assert_eq!(session.user(), Some(&user));

        let fresh = Session::authenticated(alice().with_expiry(now + Duration::hours(1)));
        assert!(fresh.is_authenticated_at(now));
        assert!(!fresh.is_authenticated_at(now + Duration::hours(2)));
    }

    #[tokio::test]
    async fn handler_applies_events_in_order() {
        let (events, handler, mut ctx) = session_channel(4);
        let task = tokio::spawn(handler.run());

        assert!(events.emit(SessionEvent::SignedIn(alice())).await);
        assert!(ctx.changed().await);
        assert!(ctx.is_authenticated());

        assert!(events.emit(SessionEvent::SignedOut).await);
        assert!(ctx.changed().await);
        assert!(!ctx.is_authenticated());

        drop(events);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn handler_shutdown_resets_to_anonymous() {
        let (events, handler, ctx) = session_channel(4);
        let task = tokio::spawn(handler.run());

        events.emit(SessionEvent::SignedIn(alice())).await;
        drop(events);
        task.await.unwrap();

        assert!(!ctx.is_authenticated());
    }

    #[tokio::test]
    async fn observe_skips_stale_updates() {
        let (_events, handler, mut ctx) = session_channel(4);
        handler.apply(SessionEvent::SignedIn(alice()));
        handler.apply(SessionEvent::SignedOut);

        assert!(!ctx.observe().is_authenticated());

        handler.apply(SessionEvent::SignedIn(alice()));
        assert!(ctx.changed().await);
        assert!(ctx.is_authenticated());
    }

    #[tokio::test]
    async fn emit_after_shutdown_reports_failure() {
        let (events, handler, _ctx) = session_channel(4);
        drop(handler);
        assert!(!events.emit(SessionEvent::SignedOut).await);
    }
}
