// src/pipeline/scheduler.rs
//! Flush scheduler
//!
//! Two states, Idle and Flushing, held in a watch channel. A flush cycle
//! starts on a timer tick (queue non-empty), when the queue reaches the
//! batch size, or on request. Only one cycle runs at a time: a trigger that
//! finds the scheduler Flushing is dropped, since the running cycle keeps
//! draining until the queue is empty.
//!
//! The first batch of a cycle is dequeued synchronously by the trigger;
//! only the network exchange runs on the executor. A batch is dequeued
//! before it is sent, so a failed send loses it.
//!
//! ```text
//!   track() ─▶ EventQueue ──(len ≥ batch)──┐
//!                  ▲                        ▼
//!   timer tick ────┼──(non-empty)──▶ trigger ──▶ Flushing ──▶ send ──┐
//!                  │                                  ▲               │
//!                  └────────── more queued? ──────────┴───────────────┘
//! ```

use crate::observability::{BATCHES_FAILED, BATCHES_SENT, EVENTS_LOST};
use crate::pipeline::event_queue::EventQueue;
use crate::pipeline::serializer::{serialize_batch, BatchContext};
use crate::session::state::Session;
use crate::transport::Transport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    Flushing,
}

/// What asked for a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Recurring timer
    Timer,
    /// Queue reached the batch size
    Threshold,
    /// Explicit flush call
    Manual,
    /// Host pause/focus/teardown signal
    Lifecycle,
}

/// Result of a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// A cycle started with a first batch of `events`
    Started { events: usize },
    /// Another cycle is in progress
    Busy,
    /// Nothing queued
    Empty,
    /// No game id to stamp yet; events stay queued
    Deferred,
}

/// Scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum events per batch
    pub max_batch_size: usize,

    /// Recurring timer period
    pub flush_interval: Duration,

    /// Platform and environment stamped on events
    pub context: BatchContext,
}

/// A dequeued, serialized batch
struct PreparedBatch {
    body: String,
    events: usize,
}

enum Prepared {
    Ready(PreparedBatch),
    Empty,
    Deferred,
}

/// Flush scheduler
pub struct FlushScheduler {
    queue: Arc<EventQueue>,
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    config: SchedulerConfig,
    state: watch::Sender<FlushState>,
    runtime: Handle,
    stats: Mutex<DeliveryStats>,
}

impl FlushScheduler {
    pub fn new(
        queue: Arc<EventQueue>,
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
        config: SchedulerConfig,
        runtime: Handle,
    ) -> Self {
        let (state, _) = watch::channel(FlushState::Idle);
        Self {
            queue,
            session,
            transport,
            config,
            state,
            runtime,
            stats: Mutex::new(DeliveryStats::default()),
        }
    }

    pub fn state(&self) -> FlushState {
        *self.state.borrow()
    }

    pub fn max_batch_size(&self) -> usize {
        self.config.max_batch_size
    }

    /// Start a flush cycle unless one is running
    pub fn trigger(self: &Arc<Self>, trigger: FlushTrigger) -> FlushOutcome {
        if self.queue.is_empty() {
            return FlushOutcome::Empty;
        }

        if !self.try_begin() {
            debug!("Flush ({:?}) ignored: flush already in progress", trigger);
            return FlushOutcome::Busy;
        }

        match self.prepare() {
            Prepared::Ready(batch) => {
                let events = batch.events;
                debug!("Flush started ({:?}), first batch of {} events", trigger, events);
                self.runtime.spawn(Arc::clone(self).drain(batch));
                FlushOutcome::Started { events }
            }
            Prepared::Empty => {
                self.finish();
                FlushOutcome::Empty
            }
            Prepared::Deferred => {
                debug!("Flush deferred: game not registered");
                self.finish();
                FlushOutcome::Deferred
            }
        }
    }

    /// Wait for the scheduler to return to Idle
    pub async fn wait_idle(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == FlushState::Idle).await;
    }

    /// Flush and wait until the queue is drained (or cannot be)
    pub async fn flush_now(self: &Arc<Self>) {
        loop {
            let outcome = self.trigger(FlushTrigger::Manual);
            self.wait_idle().await;
            match outcome {
                FlushOutcome::Started { .. } | FlushOutcome::Busy if !self.queue.is_empty() => continue,
                _ => break,
            }
        }
    }

    /// Spawn the recurring timer
    ///
    /// The period is fixed; threshold and manual flushes do not reset it.
    pub fn spawn_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let period = self.config.flush_interval;

        self.runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut interval = tokio::time::interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                if scheduler.queue.is_empty() {
                    continue;
                }
                scheduler.trigger(FlushTrigger::Timer);
            }
        })
    }

    /// Delivery statistics
    pub fn stats(&self) -> DeliveryStats {
        self.stats.lock().clone()
    }

    fn try_begin(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == FlushState::Idle {
                *state = FlushState::Flushing;
                true
            } else {
                false
            }
        })
    }

    fn finish(&self) {
        self.state.send_replace(FlushState::Idle);
    }

    /// Dequeue and serialize the next batch
    fn prepare(&self) -> Prepared {
        loop {
            let game_id = match self.session.game_id().wire_value() {
                Some(id) => id.to_string(),
                None => return Prepared::Deferred,
            };

            let events = self.queue.drain_batch(self.config.max_batch_size);
            if events.is_empty() {
                return Prepared::Empty;
            }

            debug!("Flushing {} events ({} still queued)", events.len(), self.queue.len());

            match serialize_batch(&events, &game_id, &self.config.context) {
                Ok(body) => {
                    return Prepared::Ready(PreparedBatch {
                        body,
                        events: events.len(),
                    })
                }
                Err(e) => {
                    warn!("Dropping batch of {} events: {}", events.len(), e);
                    self.record_failure(events.len());
                }
            }
        }
    }

    /// Send batches until the queue is empty, then go Idle
    async fn drain(self: Arc<Self>, first: PreparedBatch) {
        let mut batch = first;
        loop {
            self.deliver(batch).await;
            match self.prepare() {
                Prepared::Ready(next) => batch = next,
                Prepared::Empty | Prepared::Deferred => break,
            }
        }
        self.finish();

        // A threshold trigger may have been dropped after the last drain
        if self.queue.len() >= self.config.max_batch_size {
            self.trigger(FlushTrigger::Threshold);
        }
    }

    async fn deliver(&self, batch: PreparedBatch) {
        let bytes = batch.body.len();
        let started = Instant::now();

        match self.transport.send_batch(batch.body).await {
            Ok(()) => {
                let elapsed = started.elapsed();
                info!("Successfully sent batch of {} events", batch.events);
                metrics::counter!(BATCHES_SENT).increment(1);

                let mut s = self.stats.lock();
                s.batches_sent += 1;
                s.events_sent += batch.events as u64;
                s.bytes_sent += bytes as u64;
                s.total_send_time_ms += elapsed.as_millis() as u64;
            }
            Err(e) => {
                warn!("Batch send failed, {} events lost: {}", batch.events, e);
                self.record_failure(batch.events);
            }
        }
    }

    fn record_failure(&self, events: usize) {
        metrics::counter!(BATCHES_FAILED).increment(1);
        metrics::counter!(EVENTS_LOST).increment(events as u64);

        let mut s = self.stats.lock();
        s.batches_failed += 1;
        s.events_lost += events as u64;
    }
}

/// Delivery statistics
#[derive(Debug, Clone, Default)]
pub struct DeliveryStats {
    pub batches_sent: u64,
    pub batches_failed: u64,
    pub events_sent: u64,
    pub events_lost: u64,
    pub bytes_sent: u64,
    pub total_send_time_ms: u64,
}

impl DeliveryStats {
    pub fn avg_send_time_ms(&self) -> u64 {
        if self.batches_sent == 0 {
            0
        } else {
            self.total_send_time_ms / self.batches_sent
        }
    }
}
