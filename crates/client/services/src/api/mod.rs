//! REST client for the simulation backend.
//!
//! - [`client`]: [`ApiClient`] and the endpoints the backend exposes
//! - [`error`]: [`ApiError`], carrying status and body of failed calls
mod client;
mod error;

pub use client::{ApiClient, ApiResponse, DEFAULT_API_URL, Endpoint};
pub use error::ApiError;
