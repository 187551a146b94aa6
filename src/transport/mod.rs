// src/transport/mod.rs
//! Delivery to the remote collector
//!
//! - **Transport**: the seam between the SDK and the network
//! - **HttpTransport**: HTTP implementation with a pooled client
//! - **Protocol**: registration request/response bodies and endpoint paths
//!
//! Both exchanges are single POSTs with `Authorization: <apiKey>` and
//! `Content-Type: application/json`. Nothing here retries; a failed batch
//! is reported to the caller and dropped there.

pub mod http_client;
pub mod protocol;

use crate::utils::errors::Result;
use futures::future::BoxFuture;

pub use http_client::HttpTransport;
pub use protocol::{RegisterRequest, RegisterResponse, GAMES_PATH, TRACK_PATH};

/// Network exchange with the collector
pub trait Transport: Send + Sync {
    /// POST a registration body, returning the response body
    fn register_game(&self, body: String) -> BoxFuture<'_, Result<String>>;

    /// POST a serialized batch
    fn send_batch(&self, body: String) -> BoxFuture<'_, Result<()>>;
}
