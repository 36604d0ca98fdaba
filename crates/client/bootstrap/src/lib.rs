//! Startup sequencing for the RIQA client.
//!
//! Loads and validates configuration, installs logging, and assembles every
//! service around a single session into an [`AppHandle`]. Front-ends call
//! this once and own the handle for the rest of the process.
pub mod builder;
pub mod config;
pub mod logging;

pub use builder::{AppBuilder, AppHandle};
pub use config::{
    ApiConfig, AppConfig, ConfigError, EmulatorConfig, Environment, FirebaseConfig, LogConfig,
    RealtimeConfig, SessionConfig,
};
pub use logging::setup_logging;
