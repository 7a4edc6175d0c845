//! Cache event system.
//!
//! Defines cache events and an in-memory queue for event-driven invalidation.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::lock::mutex_lock;

const SOURCE: &str = "cache::events";

/// Monotonic epoch for ordering events.
///
/// Each event gets a unique, monotonically increasing epoch number.
/// Used to determine which event is "latest" when merging multiple events
/// for the same entity.
pub type Epoch = u64;

/// Cache event with idempotency and ordering support.
#[derive(Debug, Clone)]
pub struct CacheEvent {
    /// Unique identifier for idempotency (UUIDv4).
    pub id: Uuid,
    /// Monotonic epoch for ordering within this process.
    pub epoch: Epoch,
    /// The type of cache event.
    pub kind: EventKind,
    /// When the event was created.
    pub timestamp: OffsetDateTime,
}

impl CacheEvent {
    /// Create a new cache event with the given kind and epoch.
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Types of cache events that trigger invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A tool was created or updated. `previous_slug` is set when an update
    /// renamed the slug so the stale slug-keyed entry can also be dropped.
    ToolUpserted {
        tool_id: Uuid,
        slug: String,
        previous_slug: Option<String>,
    },
    /// A tool was deleted.
    ToolDeleted { tool_id: Uuid, slug: String },
    /// A category was created or updated.
    CategoryUpserted { category_id: Uuid },
    /// A category was deleted. Tools referencing it were re-pointed to no
    /// category in the same transaction.
    CategoryDeleted { category_id: Uuid },
    /// A user submitted or replaced a rating for a tool.
    RatingUpserted { tool_id: Uuid, user_id: Uuid },
}

/// In-memory event queue for cache invalidation.
///
/// Events are published by write operations and consumed by the cache consumer.
/// The queue uses a mutex for simplicity since contention is expected to be low.
pub struct EventQueue {
    queue: Mutex<VecDeque<CacheEvent>>,
    epoch_counter: AtomicU64,
}

impl EventQueue {
    /// Create a new empty event queue.
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            epoch_counter: AtomicU64::new(0),
        }
    }

    /// Get the next epoch number.
    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish an event to the queue.
    ///
    /// The event is logged for observability.
    pub fn publish(&self, kind: EventKind) {
        let epoch = self.next_epoch();
        let event = CacheEvent::new(kind.clone(), epoch);

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?kind,
            "Cache event enqueued"
        );

        mutex_lock(&self.queue, SOURCE, "publish").push_back(event);
    }

    /// Drain up to `limit` events from the queue.
    ///
    /// Returns the events in FIFO order.
    pub fn drain(&self, limit: usize) -> Vec<CacheEvent> {
        let mut queue = mutex_lock(&self.queue, SOURCE, "drain");
        let count = limit.min(queue.len());
        queue.drain(..count).collect()
    }

    /// Get the current queue length.
    pub fn len(&self) -> usize {
        mutex_lock(&self.queue, SOURCE, "len").len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all events from the queue.
    pub fn clear(&self) {
        mutex_lock(&self.queue, SOURCE, "clear").clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
