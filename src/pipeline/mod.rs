// src/pipeline/mod.rs
//! Event buffering and delivery pipeline
//!
//! - **Event**: immutable record with a pre-rendered JSON payload
//! - **Event Queue**: bounded FIFO buffer with chunked eviction
//! - **Serializer**: payload and batch wire JSON
//! - **Scheduler**: timer/threshold flush cycles, one at a time
//!
//! # Architecture
//!
//! ```text
//! track() → EventQueue ──(timer | len ≥ batch)──▶ FlushScheduler
//!                                                     │
//!                                        drain ≤ batch events (FIFO)
//!                                                     │
//!                                           serialize_batch()
//!                                                     │
//!                                         Transport::send_batch()
//! ```

pub mod event;
pub mod event_queue;
pub mod scheduler;
pub mod serializer;

// Re-export commonly used types
pub use event::{Event, Payload, PayloadValue};
pub use event_queue::{EventQueue, PushOutcome, QueueStats};
pub use scheduler::{
    DeliveryStats, FlushOutcome, FlushScheduler, FlushState, FlushTrigger, SchedulerConfig,
};
pub use serializer::{serialize_batch, serialize_payload, BatchContext};
