// src/pipeline/event_queue.rs
//! Bounded FIFO event queue with chunked eviction
//!
//! A single lock guards the buffer, so the overflow check, the eviction
//! and the push form one step with respect to `drain_batch`. When a push
//! finds the queue full, the oldest `eviction_chunk` events are discarded
//! first; survivors keep FIFO order.

use crate::observability::EVENTS_EVICTED;
use crate::pipeline::event::Event;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Result of a push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushOutcome {
    /// Queue length right after the push
    pub len: usize,

    /// Events discarded to make room
    pub evicted: usize,
}

/// Bounded event queue
pub struct EventQueue {
    /// Buffered events, oldest at the front
    events: Mutex<VecDeque<Event>>,

    /// Length bound
    capacity: usize,

    /// Oldest events dropped per overflow
    eviction_chunk: usize,

    /// Push counter
    push_count: AtomicU64,

    /// Pop counter
    pop_count: AtomicU64,

    /// Eviction counter
    evict_count: AtomicU64,
}

impl EventQueue {
    /// Create a new event queue (a zero capacity is raised to one)
    pub fn new(capacity: usize, eviction_chunk: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            eviction_chunk: eviction_chunk.max(1),
            push_count: AtomicU64::new(0),
            pop_count: AtomicU64::new(0),
            evict_count: AtomicU64::new(0),
        }
    }

    /// Push an event, evicting the oldest chunk if the queue is full
    pub fn push(&self, event: Event) -> PushOutcome {
        let (len, evicted) = {
            let mut events = self.events.lock();
            let mut evicted = 0;
            if events.len() >= self.capacity {
                evicted = self.eviction_chunk.min(events.len());
                events.drain(..evicted);
            }
            events.push_back(event);
            (events.len(), evicted)
        };

        self.push_count.fetch_add(1, Ordering::Relaxed);

        if evicted > 0 {
            self.evict_count.fetch_add(evicted as u64, Ordering::Relaxed);
            metrics::counter!(EVENTS_EVICTED).increment(evicted as u64);
            warn!("Event queue full, dropped {} oldest events", evicted);
        }

        PushOutcome { len, evicted }
    }

    /// Try to pop the oldest event
    pub fn try_pop(&self) -> Option<Event> {
        let event = self.events.lock().pop_front()?;
        self.pop_count.fetch_add(1, Ordering::Relaxed);
        Some(event)
    }

    /// Pop up to `max` events, oldest first
    pub fn drain_batch(&self, max: usize) -> Vec<Event> {
        let batch: Vec<Event> = {
            let mut events = self.events.lock();
            let take = max.min(events.len());
            events.drain(..take).collect()
        };
        self.pop_count.fetch_add(batch.len() as u64, Ordering::Relaxed);
        batch
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            push_count: self.push_count.load(Ordering::Relaxed),
            pop_count: self.pop_count.load(Ordering::Relaxed),
            evict_count: self.evict_count.load(Ordering::Relaxed),
            current_size: self.len(),
            capacity: self.capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default)]
pub struct QueueStats {
    /// Total events pushed
    pub push_count: u64,

    /// Total events dequeued for delivery
    pub pop_count: u64,

    /// Total events evicted (queue full)
    pub evict_count: u64,

    /// Current queue size
    pub current_size: usize,

    /// Queue capacity
    pub capacity: usize,
}

impl QueueStats {
    /// Calculate fill percentage
    pub fn fill_percentage(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        (self.current_size as f64 / self.capacity as f64) * 100.0
    }

    /// Percentage of pushed events lost to eviction
    pub fn eviction_rate(&self) -> f64 {
        if self.push_count == 0 {
            0.0
        } else {
            (self.evict_count as f64 / self.push_count as f64) * 100.0
        }
    }
}
