//! Subscription registry and connection lifecycle.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use client_core::SimulationUpdateEvent;
use futures::StreamExt;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("realtime transport error: {0}")]
    Transport(String),

    #[error("malformed realtime message: {0}")]
    Decode(String),
}

/// Decoded events as they arrive on the wire.
pub type EventStream = BoxStream<'static, Result<SimulationUpdateEvent, ChannelError>>;

/// Opens the underlying transport.
///
/// Reconnection, if any, belongs to the connector: a stream that yields an
/// error and then more events is treated as having reconnected.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<EventStream, ChannelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

type Handler = Arc<dyn Fn(&SimulationUpdateEvent) + Send + Sync>;
type HandlerMap = Arc<RwLock<HashMap<String, Handler>>>;

/// Single long-lived connection dispatching events to per-type handlers.
///
/// Handlers may be registered before [`connect`](Self::connect); they receive
/// nothing until the connection is up. Events of one type reach their handler
/// in wire order.
pub struct RealtimeChannel {
    url: String,
    connector: Arc<dyn RealtimeConnector>,
    handlers: HandlerMap,
    state: Arc<watch::Sender<ConnectionState>>,
    reader: Option<JoinHandle<()>>,
}

impl RealtimeChannel {
    pub fn new(url: impl Into<String>, connector: Arc<dyn RealtimeConnector>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            url: url.into(),
            connector,
            handlers: Arc::new(RwLock::new(HashMap::new())),
            state: Arc::new(state),
            reader: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Register `handler` for `event_type`, replacing any previous handler.
    pub fn subscribe<F>(&self, event_type: impl Into<String>, handler: F)
    where
        F: Fn(&SimulationUpdateEvent) + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        let replaced = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event_type.clone(), Arc::new(handler))
            .is_some();

        if replaced {
            tracing::debug!("Replaced realtime handler for {}", event_type);
        }
    }

    /// Remove the handler for `event_type`. Returns whether one was registered.
    pub fn unsubscribe(&self, event_type: &str) -> bool {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(event_type)
            .is_some()
    }

    pub fn is_subscribed(&self, event_type: &str) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(event_type)
    }

    /// Open the connection and start dispatching. A no-op while connected.
    ///
    /// # Errors
    ///
    /// Returns the connector's error; the channel stays disconnected.
    pub async fn connect(&mut self) -> Result<(), ChannelError> {
        if self.reader.as_ref().is_some_and(|reader| !reader.is_finished()) {
            tracing::debug!("Realtime channel already connected");
            return Ok(());
        }

        self.state.send_replace(ConnectionState::Connecting);

        let stream = match self.connector.connect(&self.url).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("Realtime connect failed: {}", err);
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(err);
            }
        };

        self.state.send_replace(ConnectionState::Connected);
        tracing::info!("Realtime channel connected to {}", self.url);

        self.reader = Some(tokio::spawn(read_events(
            stream,
            Arc::clone(&self.handlers),
            Arc::clone(&self.state),
        )));

        Ok(())
    }

    /// Close the connection. Handlers stay registered.
    pub fn disconnect(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            tracing::info!("Realtime channel disconnected");
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }
}

impl Drop for RealtimeChannel {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

async fn read_events(
    mut stream: EventStream,
    handlers: HandlerMap,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(event) => {
                if *state.borrow() != ConnectionState::Connected {
                    tracing::info!("Realtime transport recovered");
                    state.send_replace(ConnectionState::Connected);
                }
                dispatch(&handlers, &event);
            }
            Err(ChannelError::Decode(reason)) => {
                tracing::warn!("Dropping malformed realtime message: {}", reason);
            }
            Err(err) => {
                tracing::warn!("Realtime channel down: {}", err);
                state.send_replace(ConnectionState::Disconnected);
            }
        }
    }

    tracing::info!("Realtime stream closed");
    state.send_replace(ConnectionState::Disconnected);
}

fn dispatch(handlers: &HandlerMap, event: &SimulationUpdateEvent) {
    // Clone out so the lock is not held while user code runs.
    let handler = handlers
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&event.event_type)
        .cloned();

    match handler {
        Some(handler) => handler(event),
        None => tracing::trace!("No handler for realtime event {}", event.event_type),
    }
}
