//! Cache trigger service.
//!
//! Provides a high-level API for publishing cache events and optionally
//! consuming them immediately.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::config::CacheConfig;
use super::consumer::CacheConsumer;
use super::events::{EventKind, EventQueue};

/// Cache trigger for publishing cache events.
///
/// This service wraps the event queue and consumer, providing convenience
/// methods for triggering cache invalidation from write operations. The
/// mutation services call these after a successful commit and before
/// reporting success, so no subsequent read can observe a stale entry.
///
/// # Usage
///
/// ```ignore
/// // After a successful rating upsert:
/// trigger.rating_upserted(tool_id, user_id).await;
/// ```
pub struct CacheTrigger {
    config: CacheConfig,
    queue: Arc<EventQueue>,
    consumer: Arc<CacheConsumer>,
}

impl CacheTrigger {
    /// Create a new cache trigger.
    pub fn new(config: CacheConfig, queue: Arc<EventQueue>, consumer: Arc<CacheConsumer>) -> Self {
        Self {
            config,
            queue,
            consumer,
        }
    }

    /// Publish an event and optionally consume immediately.
    ///
    /// If `consume_now` is true, the queue is drained to empty before
    /// returning, so the published event's invalidation is applied even
    /// when a backlog exceeds the per-batch limit. Otherwise, events wait
    /// for the next explicit consumption.
    pub async fn trigger(&self, kind: EventKind, consume_now: bool) {
        if !self.config.enabled {
            debug!(event_kind = ?kind, "Cache trigger skipped: cache disabled");
            return;
        }

        self.queue.publish(kind);

        if consume_now {
            while self.consumer.consume().await {}
        }
    }

    /// Trigger a tool upsert event (create or update).
    pub async fn tool_upserted(&self, tool_id: Uuid, slug: &str, previous_slug: Option<&str>) {
        self.trigger(
            EventKind::ToolUpserted {
                tool_id,
                slug: slug.to_string(),
                previous_slug: previous_slug.map(str::to_string),
            },
            true,
        )
        .await;
    }

    /// Trigger a tool delete event.
    pub async fn tool_deleted(&self, tool_id: Uuid, slug: &str) {
        self.trigger(
            EventKind::ToolDeleted {
                tool_id,
                slug: slug.to_string(),
            },
            true,
        )
        .await;
    }

    /// Trigger a category upsert event (create or update).
    pub async fn category_upserted(&self, category_id: Uuid) {
        self.trigger(EventKind::CategoryUpserted { category_id }, true)
            .await;
    }

    /// Trigger a category delete event.
    pub async fn category_deleted(&self, category_id: Uuid) {
        self.trigger(EventKind::CategoryDeleted { category_id }, true)
            .await;
    }

    /// Trigger a rating upsert event.
    pub async fn rating_upserted(&self, tool_id: Uuid, user_id: Uuid) {
        self.trigger(EventKind::RatingUpserted { tool_id, user_id }, true)
            .await;
    }

    /// Get the underlying config.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the underlying event queue.
    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Get the underlying consumer.
    pub fn consumer(&self) -> &Arc<CacheConsumer> {
        &self.consumer
    }
}
