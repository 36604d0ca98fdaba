//! Realtime channel for server-pushed simulation progress.
//!
//! - [`channel`]: [`RealtimeChannel`], handler registry and reader task
//! - [`ws`]: [`WsConnector`], the WebSocket transport
mod channel;
mod ws;

pub use channel::{ChannelError, ConnectionState, EventStream, RealtimeChannel, RealtimeConnector};
pub use ws::WsConnector;
