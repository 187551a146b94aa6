// src/lib.rs
//! Tokebi analytics client
//!
//! Application code emits named events with key/value payloads; the client
//! buffers them in a bounded queue and periodically delivers them to the
//! Tokebi collector as JSON batches over HTTP.
//!
//! # Architecture
//!
//! - **client**: `TokebiClient`, the tracking facade
//! - **pipeline**: event queue, serializer, flush scheduler
//! - **session**: player identity, registration, multiplayer role
//! - **transport**: collector HTTP exchange
//! - **observability**: tracing setup and metric names
//! - **utils**: configuration and errors
//!
//! # Example
//!
//! ```rust,no_run
//! use tokebi::{Payload, SdkConfig, TokebiClient};
//!
//! #[tokio::main]
//! async fn main() -> tokebi::Result<()> {
//!     let client = TokebiClient::start(SdkConfig::new("your-api-key"))?;
//!
//!     client.track_level_start("1-1");
//!     client.track("coin_collected", Some(Payload::new().with("value", 10)), false);
//!
//!     client.flush_now().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod observability;
pub mod pipeline;
pub mod session;
pub mod transport;
pub mod utils;

// Re-export commonly used types
pub use client::{ClientStats, TokebiClient};
pub use pipeline::{Event, Payload, PayloadValue};
pub use session::{GameId, Registration};
pub use transport::{HttpTransport, Transport};
pub use utils::config::{Environment, SdkConfig};
pub use utils::errors::{Result, TokebiError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");

/// SDK build information
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub rustc_version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            version: VERSION,
            git_hash: GIT_HASH,
            build_timestamp: env!("BUILD_TIMESTAMP"),
            rustc_version: env!("RUSTC_VERSION"),
        }
    }
}
