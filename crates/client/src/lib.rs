//! Top-level RIQA client: a running app plus the terminal shell driving it.
//!
//! # Architecture
//!
//! ```text
//! Client (composition root)
//!   ├─→ AppHandle (session, auth, API, store, realtime; from client-bootstrap)
//!   └─→ Shell (command loop; navigates through the guarded router)
//! ```
//!
//! The shell only reaches services through the handle, and every guarded
//! navigation reads the handle's session at the moment it happens.

pub mod shell;

pub use shell::{Command, CommandError, Flow, Shell, TerminalRenderer};

use anyhow::Result;
use client_bootstrap::AppHandle;
use client_core::SIMULATION_UPDATE;
use client_services::RealtimeChannel;
use tokio::io::BufReader;

pub struct Client {
    app: AppHandle,
}

impl Client {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    /// Run the shell on stdin/stdout until the user quits, then shut down.
    pub async fn run(self) -> Result<()> {
        let mut app = self.app;
        log_simulation_updates(app.realtime());

        let mut shell = Shell::new(&app);
        let result = shell
            .run(
                &mut app,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await;

        app.shutdown().await;
        result
    }
}

/// Log every `simulation_update` event the channel delivers.
pub fn log_simulation_updates(channel: &RealtimeChannel) {
    channel.subscribe(SIMULATION_UPDATE, |event| {
        tracing::info!("Simulation update: {}", event.payload);
    });
}
