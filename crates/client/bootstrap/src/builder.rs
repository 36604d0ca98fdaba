//! Assembles the session, navigation and backend services used by front-ends.
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use client_core::{
    NavigationGuard, Navigator, RouteTable, SessionContext, ViewRenderer, session_channel,
};
use client_services::{
    ApiClient, DocumentBackend, FirebaseAuth, FirestoreBackend, HttpTransport, RealtimeChannel,
    RealtimeConnector, ReqwestTransport, SimulationStore, WsConnector,
};
use tokio::task::JoinHandle;

use crate::config::AppConfig;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Builder that wires every client service around one session.
///
/// Each seam defaults to its production implementation and can be replaced,
/// which is how tests run the whole stack without a network.
pub struct AppBuilder {
    config: AppConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    connector: Option<Arc<dyn RealtimeConnector>>,
    document_backend: Option<Arc<dyn DocumentBackend>>,
    routes: Option<RouteTable>,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            transport: None,
            connector: None,
            document_backend: None,
            routes: None,
        }
    }

    /// HTTP transport shared by the API client, auth provider and Firestore.
    pub fn transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn connector(mut self, connector: impl RealtimeConnector + 'static) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    /// Replace the Firestore backend (e.g. with an in-memory store).
    pub fn document_backend(mut self, backend: impl DocumentBackend + 'static) -> Self {
        self.document_backend = Some(Arc::new(backend));
        self
    }

    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Spawn the session handler and build every service.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(self) -> Result<AppHandle> {
        let config = self.config;

        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let client = reqwest::Client::builder()
                    .user_agent(concat!("riqa-client/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .context("Failed to build HTTP client")?;
                Arc::new(ReqwestTransport::with_client(client))
            }
        };
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(WsConnector));

        let (events, handler, session) = session_channel(config.session.event_buffer);
        let session_task = tokio::spawn(handler.run());

        let document_backend = self.document_backend.unwrap_or_else(|| {
            Arc::new(FirestoreBackend::new(
                config.firestore_config(),
                Arc::clone(&transport),
                session.clone(),
            ))
        });

        let auth = FirebaseAuth::new(config.auth_config(), Arc::clone(&transport), events);
        let api = ApiClient::new(
            config.api.base_url.clone(),
            Arc::clone(&transport),
            session.clone(),
        );
        let store = SimulationStore::new(document_backend);
        let realtime = RealtimeChannel::new(config.realtime.url.clone(), connector);
        let routes = Arc::new(self.routes.unwrap_or_default());

        tracing::info!(
            "Client started: env={}, api={}, realtime={}, emulators={}",
            config.environment,
            config.api.base_url,
            config.realtime.url,
            config.emulators.enabled
        );

        Ok(AppHandle {
            config,
            session,
            auth,
            api,
            store,
            realtime,
            routes,
            session_task,
        })
    }
}

/// A running client instance.
///
/// Owns the only session of the instance; every service reads it through a
/// [`SessionContext`]. Starting twice yields two independent handles.
pub struct AppHandle {
    config: AppConfig,
    session: SessionContext,
    auth: FirebaseAuth,
    api: ApiClient,
    store: SimulationStore,
    realtime: RealtimeChannel,
    routes: Arc<RouteTable>,
    session_task: JoinHandle<()>,
}

impl AppHandle {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session(&self) -> SessionContext {
        self.session.clone()
    }

    pub fn auth(&self) -> &FirebaseAuth {
        &self.auth
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SimulationStore {
        &self.store
    }

    pub fn realtime(&self) -> &RealtimeChannel {
        &self.realtime
    }

    pub fn realtime_mut(&mut self) -> &mut RealtimeChannel {
        &mut self.realtime
    }

    pub fn routes(&self) -> Arc<RouteTable> {
        Arc::clone(&self.routes)
    }

    /// A navigator over this instance's routes, guarded by its session.
    pub fn navigator<R: ViewRenderer>(&self, renderer: R) -> Navigator<R> {
        Navigator::new(
            self.routes(),
            NavigationGuard::new(self.session()),
            renderer,
        )
    }

    /// Close the realtime channel and stop the session handler.
    ///
    /// The handler stops once every sender is gone; clones of the auth
    /// provider held elsewhere keep it alive past the grace period.
    pub async fn shutdown(self) {
        let Self {
            mut realtime,
            auth,
            session_task,
            ..
        } = self;

        realtime.disconnect();
        drop(auth);

        match tokio::time::timeout(SHUTDOWN_GRACE, session_task).await {
            Ok(_) => tracing::info!("Client stopped"),
            Err(_) => tracing::warn!("Session handler still has live senders, detaching"),
        }
    }
}
