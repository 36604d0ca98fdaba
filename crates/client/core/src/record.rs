//! Simulation records and realtime update payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event type emitted by the backend while a simulation is running.
pub const SIMULATION_UPDATE: &str = "simulation_update";

/// Opaque identity of an authenticated user, as issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document identifier assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted simulation run.
///
/// Records are append-only from the client's point of view: they are created
/// once through the document store and only ever read back afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    /// Identifier assigned by the store
    pub id: RecordId,

    /// Owner the record is scoped to
    pub owner_id: UserId,

    /// Simulation parameters and results, opaque to the client
    pub payload: serde_json::Value,

    /// Creation time stamped by the store, never by the caller
    pub created_at: DateTime<Utc>,
}

/// A simulation record that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSimulation {
    pub owner_id: UserId,
    pub payload: serde_json::Value,

    /// Caller-side creation time. The store discards it and stamps its own.
    pub created_at: Option<DateTime<Utc>>,
}

impl NewSimulation {
    pub fn new(owner_id: UserId, payload: serde_json::Value) -> Self {
        Self {
            owner_id,
            payload,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}

/// Transient progress message pushed over the realtime channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationUpdateEvent {
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default)]
    pub payload: serde_json::Value,
}

impl SimulationUpdateEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}
