//! RIQA client binary.
//!
//! Composition root: loads configuration, installs logging, starts the app
//! and hands control to the command shell.
//!
//! # Examples
//!
//! ```bash
//! # Development against local emulators
//! RIQA_WS_URL=ws://localhost:5000/socket FIREBASE_API_KEY=dev FIREBASE_PROJECT_ID=riqa-dev \
//!     cargo run -p riqa-client
//! ```

use anyhow::{Context, Result};
use client_bootstrap::{AppBuilder, AppConfig, logging};
use riqa_client::Client;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. Configuration is validated before anything starts
    let config = AppConfig::from_env().context("Invalid client configuration")?;

    // 2. Logging
    let _log_guard = logging::setup_logging(&config.log)?;

    tracing::info!("Starting RIQA client ({})", config.environment);

    // 3. Services around a single session
    let app = AppBuilder::new(config).start().await?;

    // 4. Shell
    Client::new(app).run().await?;

    tracing::info!("Client shutdown complete");
    Ok(())
}
