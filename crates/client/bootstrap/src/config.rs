//! Client configuration structures and loaders.
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use client_services::{DEFAULT_API_URL, FirebaseAuthConfig, FirestoreConfig};
use thiserror::Error;

const DEFAULT_AUTH_EMULATOR: &str = "localhost:9099";
const DEFAULT_FIRESTORE_EMULATOR: &str = "localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required configuration {key}")]
    Missing { key: &'static str },

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Deployment profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => f.write_str("development"),
            Environment::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "unknown environment {other}, expected development or production"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealtimeConfig {
    pub url: String,
}

/// Firebase project settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub auth_domain: String,
    pub storage_bucket: String,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
}

/// Local Firebase emulator endpoints, as `host:port`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmulatorConfig {
    pub enabled: bool,
    pub auth_host: String,
    pub firestore_host: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capacity of the session event queue
    pub event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { event_buffer: 16 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Overrides the platform cache directory
    pub directory: Option<PathBuf>,

    /// Write a log file in addition to stderr
    pub to_file: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: None,
            to_file: true,
        }
    }
}

/// Everything the client needs before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub realtime: RealtimeConfig,
    pub firebase: FirebaseConfig,
    pub emulators: EmulatorConfig,
    pub session: SessionConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `RIQA_ENV` - `development` or `production` (default: development)
    /// - `RIQA_API_URL` - Backend base URL (required in production)
    /// - `RIQA_WS_URL` - Realtime WebSocket endpoint (required)
    /// - `FIREBASE_API_KEY`, `FIREBASE_PROJECT_ID` - Firebase project (required)
    /// - `FIREBASE_AUTH_DOMAIN`, `FIREBASE_STORAGE_BUCKET` - Derived from the project id when unset
    /// - `FIREBASE_MESSAGING_SENDER_ID`, `FIREBASE_APP_ID` - Optional
    /// - `RIQA_USE_EMULATORS` - Talk to local emulators (default: true in development)
    /// - `FIREBASE_AUTH_EMULATOR_HOST` - Auth emulator (default: localhost:9099)
    /// - `FIRESTORE_EMULATOR_HOST` - Firestore emulator (default: localhost:8080)
    /// - `RIQA_SESSION_BUFFER` - Session event queue size (default: 16)
    /// - `RIQA_LOG_DIR` - Log directory (default: platform cache dir)
    /// - `RIQA_LOG_FILE` - Write a log file (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Construct configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset. Nothing is partially applied: either
    /// the whole configuration validates or an error names the first bad key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let environment = read_parsed::<Environment>(&read, "RIQA_ENV")?.unwrap_or_default();

        let base_url = match read("RIQA_API_URL") {
            Some(url) => url,
            None if environment.is_production() => {
                return Err(ConfigError::Missing {
                    key: "RIQA_API_URL",
                });
            }
            None => {
                tracing::debug!("RIQA_API_URL unset, using {}", DEFAULT_API_URL);
                DEFAULT_API_URL.to_string()
            }
        };
        validate_url("RIQA_API_URL", &base_url, &["http://", "https://"])?;

        let ws_url = require(&read, "RIQA_WS_URL")?;
        validate_url("RIQA_WS_URL", &ws_url, &["ws://", "wss://"])?;

        let project_id = require(&read, "FIREBASE_PROJECT_ID")?;
        let firebase = FirebaseConfig {
            api_key: require(&read, "FIREBASE_API_KEY")?,
            auth_domain: read("FIREBASE_AUTH_DOMAIN")
                .unwrap_or_else(|| format!("{project_id}.firebaseapp.com")),
            storage_bucket: read("FIREBASE_STORAGE_BUCKET")
                .unwrap_or_else(|| format!("{project_id}.appspot.com")),
            messaging_sender_id: read("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: read("FIREBASE_APP_ID"),
            project_id,
        };

        let emulators = EmulatorConfig {
            enabled: read_parsed_with(&read, "RIQA_USE_EMULATORS", parse_bool)?
                .unwrap_or(!environment.is_production()),
            auth_host: read("FIREBASE_AUTH_EMULATOR_HOST")
                .unwrap_or_else(|| DEFAULT_AUTH_EMULATOR.to_string()),
            firestore_host: read("FIRESTORE_EMULATOR_HOST")
                .unwrap_or_else(|| DEFAULT_FIRESTORE_EMULATOR.to_string()),
        };

        let mut session = SessionConfig::default();
        if let Some(buffer) = read_parsed::<usize>(&read, "RIQA_SESSION_BUFFER")? {
            session.event_buffer = buffer.max(1);
        }

        let log = LogConfig {
            directory: read("RIQA_LOG_DIR").map(PathBuf::from),
            to_file: read_parsed_with(&read, "RIQA_LOG_FILE", parse_bool)?.unwrap_or(true),
        };

        Ok(Self {
            environment,
            api: ApiConfig { base_url },
            realtime: RealtimeConfig { url: ws_url },
            firebase,
            emulators,
            session,
            log,
        })
    }

    pub fn auth_config(&self) -> FirebaseAuthConfig {
        let config = FirebaseAuthConfig::new(self.firebase.api_key.clone());
        if self.emulators.enabled {
            config.with_emulator(self.emulators.auth_host.clone())
        } else {
            config
        }
    }

    pub fn firestore_config(&self) -> FirestoreConfig {
        let config = FirestoreConfig::new(self.firebase.project_id.clone());
        if self.emulators.enabled {
            config.with_emulator(self.emulators.firestore_host.clone())
        } else {
            config
        }
    }
}

fn require<R>(read: &R, key: &'static str) -> Result<String, ConfigError>
where
    R: Fn(&str) -> Option<String>,
{
    read(key).ok_or(ConfigError::Missing { key })
}

fn read_parsed<T>(
    read: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    read_parsed_with(read, key, |raw| raw.parse::<T>().map_err(|err| err.to_string()))
}

fn read_parsed_with<T>(
    read: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigError> {
    read(key)
        .map(|raw| parse(&raw).map_err(|reason| ConfigError::invalid(key, &raw, reason)))
        .transpose()
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}

fn validate_url(key: &'static str, url: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let Some(scheme) = schemes.iter().find(|scheme| url.starts_with(**scheme)) else {
        return Err(ConfigError::invalid(
            key,
            url,
            format!("URL must start with {}", schemes.join(" or ")),
        ));
    };
    if url.len() == scheme.len() {
        return Err(ConfigError::invalid(key, url, "URL has no host"));
    }
    Ok(())
}
