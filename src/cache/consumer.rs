//! Cache consumer for executing consumption plans.
//!
//! Consumes events from the queue and executes invalidation actions.
//! Dropped entries are repopulated lazily on the next read-through, so the
//! consumer never talks to the database.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{info, instrument};
use uuid::Uuid;

use super::config::CacheConfig;
use super::events::EventQueue;
use super::keys::EntityKey;
use super::planner::ConsumptionPlan;
use super::store::CatalogStore;

const METRIC_CACHE_CONSUME_MS: &str = "vetrina_cache_consume_ms";
const METRIC_CACHE_INVALIDATIONS: &str = "vetrina_cache_invalidations_total";

/// Cache consumer that processes events and maintains cache consistency.
///
/// The consumer:
/// 1. Drains events from the queue
/// 2. Generates a consumption plan from the events
/// 3. Executes the plan against the store
pub struct CacheConsumer {
    config: CacheConfig,
    store: Arc<CatalogStore>,
    queue: Arc<EventQueue>,
}

impl CacheConsumer {
    /// Create a new cache consumer.
    pub fn new(config: CacheConfig, store: Arc<CatalogStore>, queue: Arc<EventQueue>) -> Self {
        Self {
            config,
            store,
            queue,
        }
    }

    /// Consume pending events and execute the plan.
    ///
    /// Returns true if any events were processed.
    #[instrument(skip(self))]
    pub async fn consume(&self) -> bool {
        let consume_started_at = Instant::now();
        let events = self.queue.drain(self.config.consume_batch_limit);
        if events.is_empty() {
            return false;
        }

        let event_count = events.len();
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        let plan = ConsumptionPlan::from_events(events);

        info!(
            event_count,
            event_ids = ?event_ids,
            plan = %plan,
            "Cache consumption starting"
        );

        if self.config.enabled && !plan.invalidate_entities.is_empty() {
            self.invalidate(&plan);
        }

        info!(
            event_count,
            invalidated = plan.invalidate_entities.len(),
            "Cache consumption complete"
        );

        counter!(METRIC_CACHE_INVALIDATIONS)
            .increment(plan.invalidate_entities.len() as u64);
        histogram!(METRIC_CACHE_CONSUME_MS)
            .record(consume_started_at.elapsed().as_secs_f64() * 1000.0);

        true
    }

    /// Invalidate store entries based on the plan.
    fn invalidate(&self, plan: &ConsumptionPlan) {
        for entity in &plan.invalidate_entities {
            match entity {
                EntityKey::Categories => self.store.invalidate_categories(),
                EntityKey::Tool(id) => {
                    // Pull the cached listing to learn its slug
                    if let Some(listing) = self.store.get_tool_by_id(*id) {
                        self.store.invalidate_tool(*id, &listing.tool.slug);
                    }
                }
                EntityKey::ToolSlug(slug) => self.store.invalidate_tool_slug(slug),
                EntityKey::ToolsAll => self.store.invalidate_all_tools(),
                EntityKey::ToolLists => self.store.invalidate_all_tool_lists(),
                EntityKey::Aggregate(tool_id) => self.store.invalidate_aggregate(*tool_id),
                EntityKey::UserRating { tool_id, user_id } => {
                    self.store.invalidate_user_rating(*tool_id, *user_id);
                }
                EntityKey::UserRatingsAll => self.store.invalidate_all_user_ratings(),
            }
        }
    }

    /// Get reference to the event queue.
    pub fn queue(&self) -> &Arc<EventQueue> {
        &self.queue
    }

    /// Get reference to the store.
    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::cache::events::EventKind;
    use crate::domain::entities::{RatingAggregate, ToolListing, ToolRecord};
    use crate::domain::types::{SharedAccess, ToolStatus};

    use super::*;

    fn create_consumer() -> CacheConsumer {
        let config = CacheConfig::default();
        let store = Arc::new(CatalogStore::new(&config));
        let queue = Arc::new(EventQueue::new());

        CacheConsumer::new(config, store, queue)
    }

    fn sample_listing(id: Uuid, slug: &str) -> ToolListing {
        ToolListing {
            tool: ToolRecord {
                id,
                slug: slug.to_string(),
                name: "Test Tool".to_string(),
                short_description: "A tool".to_string(),
                full_description: None,
                category_id: None,
                website_url: "https://example.com".to_string(),
                cover_image: None,
                logo_image: None,
                featured: false,
                status: ToolStatus::Published,
                shared_access: SharedAccess::Disabled,
                created_at: OffsetDateTime::now_utc(),
            },
            category: None,
        }
    }

    #[tokio::test]
    async fn consume_empty_queue_returns_false() {
        let consumer = create_consumer();
        assert!(!consumer.consume().await);
    }

    #[tokio::test]
    async fn consume_processes_events() {
        let consumer = create_consumer();

        consumer.queue.publish(EventKind::CategoryUpserted {
            category_id: Uuid::new_v4(),
        });
        consumer.queue.publish(EventKind::RatingUpserted {
            tool_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        });

        assert_eq!(consumer.queue.len(), 2);
        assert!(consumer.consume().await);
        assert!(consumer.queue.is_empty());
    }

    #[tokio::test]
    async fn consume_respects_batch_limit() {
        let config = CacheConfig {
            consume_batch_limit: 2,
            ..Default::default()
        };
        let store = Arc::new(CatalogStore::new(&config));
        let queue = Arc::new(EventQueue::new());

        let consumer = CacheConsumer::new(config, store, queue);

        for _ in 0..5 {
            consumer.queue.publish(EventKind::CategoryUpserted {
                category_id: Uuid::new_v4(),
            });
        }

        assert_eq!(consumer.queue.len(), 5);
        consumer.consume().await;
        assert_eq!(consumer.queue.len(), 3); // Only consumed 2
    }

    #[tokio::test]
    async fn rating_event_drops_aggregate_and_lists_but_not_tool() {
        let consumer = create_consumer();

        let tool_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let listing = sample_listing(tool_id, "figma");

        consumer.store.set_tool(listing.clone());
        consumer.store.set_aggregate(
            tool_id,
            RatingAggregate {
                average: 4.0,
                count: 2,
            },
        );
        consumer.store.set_user_rating(tool_id, user_id, None);
        consumer.store.set_tool_list(
            1,
            vec![crate::domain::entities::CatalogEntry::from_listing(
                listing,
                RatingAggregate::EMPTY,
            )],
        );

        consumer
            .queue
            .publish(EventKind::RatingUpserted { tool_id, user_id });
        consumer.consume().await;

        assert!(consumer.store.get_aggregate(tool_id).is_none());
        assert!(consumer.store.get_user_rating(tool_id, user_id).is_none());
        assert!(consumer.store.get_tool_list(1).is_none());
        // The tool record itself is untouched.
        assert!(consumer.store.get_tool_by_id(tool_id).is_some());
    }

    #[tokio::test]
    async fn tool_delete_drops_everything_for_that_tool() {
        let consumer = create_consumer();

        let tool_id = Uuid::new_v4();
        consumer.store.set_tool(sample_listing(tool_id, "figma"));
        consumer.store.set_aggregate(tool_id, RatingAggregate::EMPTY);

        consumer.queue.publish(EventKind::ToolDeleted {
            tool_id,
            slug: "figma".to_string(),
        });
        consumer.consume().await;

        assert!(consumer.store.get_tool_by_id(tool_id).is_none());
        assert!(consumer.store.get_tool_by_slug("figma").is_none());
        assert!(consumer.store.get_aggregate(tool_id).is_none());
    }

    #[tokio::test]
    async fn disabled_cache_still_drains_events() {
        let config = CacheConfig {
            enabled: false,
            ..Default::default()
        };
        let store = Arc::new(CatalogStore::new(&config));
        let queue = Arc::new(EventQueue::new());
        let consumer = CacheConsumer::new(config, store, queue);

        consumer.queue.publish(EventKind::CategoryUpserted {
            category_id: Uuid::new_v4(),
        });

        assert!(consumer.consume().await);
        assert!(consumer.queue.is_empty());
    }
}
