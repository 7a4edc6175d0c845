//! Rating submission and per-user rating lookups.
//!
//! A user holds at most one rating per tool; submitting again replaces the
//! previous value. Every successful submission invalidates the affected
//! cache entries before reporting success, so a read issued right after a
//! submit always observes the new aggregate.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::cache::{CacheConfig, CacheTrigger, CatalogStore};
use crate::domain::entities::RatingRecord;

use super::error::AppError;
use super::identity::Identity;
use super::repos::{RatingsRepo, ToolsRepo};

const METRIC_CACHE_HITS: &str = "vetrina_cache_hits_total";
const METRIC_CACHE_MISSES: &str = "vetrina_cache_misses_total";
const METRIC_RATINGS_SUBMITTED: &str = "vetrina_ratings_submitted_total";

pub const MIN_RATING: i16 = 1;
pub const MAX_RATING: i16 = 5;

/// Rating submission and lookup service.
#[derive(Clone)]
pub struct RatingService {
    tools: Arc<dyn ToolsRepo>,
    ratings: Arc<dyn RatingsRepo>,
    cache: Arc<CatalogStore>,
    trigger: Arc<CacheTrigger>,
    cache_enabled: bool,
}

impl RatingService {
    pub fn new(
        tools: Arc<dyn ToolsRepo>,
        ratings: Arc<dyn RatingsRepo>,
        cache: Arc<CatalogStore>,
        trigger: Arc<CacheTrigger>,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            tools,
            ratings,
            cache,
            trigger,
            cache_enabled: cache_config.enabled,
        }
    }

    /// Submit or replace the caller's rating for a tool.
    ///
    /// Requires a present identity. The value must be within 1..=5 and the
    /// tool must exist. The upsert is atomic per (tool, user); concurrent
    /// submissions for the same pair settle on one of the submitted values
    /// without surfacing a conflict.
    #[instrument(skip(self, identity))]
    pub async fn submit(
        &self,
        identity: Option<Identity>,
        tool_id: Uuid,
        value: i16,
    ) -> Result<RatingRecord, AppError> {
        let user_id = identity.ok_or(AppError::Unauthorized)?.id;

        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(AppError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
            )));
        }

        if self.tools.find_by_id(tool_id).await?.is_none() {
            return Err(AppError::NotFound);
        }

        let record = self.ratings.upsert_rating(tool_id, user_id, value).await?;

        // Invalidation happens before success is reported.
        self.trigger.rating_upserted(tool_id, user_id).await;

        counter!(METRIC_RATINGS_SUBMITTED).increment(1);
        info!(
            tool_id = %tool_id,
            user_id = %user_id,
            value,
            "Rating stored"
        );

        Ok(record)
    }

    /// The caller's current rating of a tool, if any.
    ///
    /// Negative lookups are memoized too: a user who has not rated is a
    /// cache hit saying so, not a repeated database probe.
    #[instrument(skip(self, identity))]
    pub async fn user_rating(
        &self,
        identity: Option<Identity>,
        tool_id: Uuid,
    ) -> Result<Option<RatingRecord>, AppError> {
        let user_id = identity.ok_or(AppError::Unauthorized)?.id;

        if self.cache_enabled
            && let Some(cached) = self.cache.get_user_rating(tool_id, user_id)
        {
            counter!(METRIC_CACHE_HITS, "surface" => "user_rating").increment(1);
            return Ok(cached);
        }
        counter!(METRIC_CACHE_MISSES, "surface" => "user_rating").increment(1);

        let rating = self.ratings.find_user_rating(tool_id, user_id).await?;
        if self.cache_enabled {
            self.cache
                .set_user_rating(tool_id, user_id, rating.clone());
        }
        Ok(rating)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use crate::application::repos::{RepoError, ToolListScope, ToolQueryFilter};
    use crate::cache::{CacheConsumer, EventQueue};
    use crate::domain::entities::{RatingAggregate, ToolListing, ToolRecord};
    use crate::domain::types::{SharedAccess, ToolStatus};

    use super::*;

    struct StubToolsRepo {
        known: Vec<Uuid>,
    }

    #[async_trait]
    impl ToolsRepo for StubToolsRepo {
        async fn list_tools(
            &self,
            _scope: ToolListScope,
            _filter: &ToolQueryFilter,
        ) -> Result<Vec<ToolListing>, RepoError> {
            Ok(Vec::new())
        }

        async fn find_by_slug(&self, _slug: &str) -> Result<Option<ToolListing>, RepoError> {
            Ok(None)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<ToolRecord>, RepoError> {
            if !self.known.contains(&id) {
                return Ok(None);
            }
            Ok(Some(ToolRecord {
                id,
                slug: "figma".to_string(),
                name: "Figma".to_string(),
                short_description: "desc".to_string(),
                full_description: None,
                category_id: None,
                website_url: "https://example.com".to_string(),
                cover_image: None,
                logo_image: None,
                featured: false,
                status: ToolStatus::Published,
                shared_access: SharedAccess::Disabled,
                created_at: OffsetDateTime::now_utc(),
            }))
        }
    }

    #[derive(Default)]
    struct InMemoryRatingsRepo {
        rows: Mutex<HashMap<(Uuid, Uuid), i16>>,
    }

    #[async_trait]
    impl RatingsRepo for InMemoryRatingsRepo {
        async fn upsert_rating(
            &self,
            tool_id: Uuid,
            user_id: Uuid,
            value: i16,
        ) -> Result<RatingRecord, RepoError> {
            self.rows.lock().unwrap().insert((tool_id, user_id), value);
            let now = OffsetDateTime::now_utc();
            Ok(RatingRecord {
                id: Uuid::new_v4(),
                tool_id,
                user_id,
                value,
                created_at: now,
                updated_at: now,
            })
        }

        async fn find_user_rating(
            &self,
            tool_id: Uuid,
            user_id: Uuid,
        ) -> Result<Option<RatingRecord>, RepoError> {
            let now = OffsetDateTime::now_utc();
            Ok(self
                .rows
                .lock()
                .unwrap()
                .get(&(tool_id, user_id))
                .map(|value| RatingRecord {
                    id: Uuid::new_v4(),
                    tool_id,
                    user_id,
                    value: *value,
                    created_at: now,
                    updated_at: now,
                }))
        }

        async fn aggregate_for(&self, tool_id: Uuid) -> Result<RatingAggregate, RepoError> {
            let rows = self.rows.lock().unwrap();
            let values: Vec<i16> = rows
                .iter()
                .filter(|((tool, _), _)| *tool == tool_id)
                .map(|(_, value)| *value)
                .collect();
            if values.is_empty() {
                return Ok(RatingAggregate::EMPTY);
            }
            Ok(RatingAggregate {
                average: values.iter().map(|v| f64::from(*v)).sum::<f64>()
                    / values.len() as f64,
                count: values.len() as u64,
            })
        }

        async fn aggregate_for_many(
            &self,
            tool_ids: &[Uuid],
        ) -> Result<HashMap<Uuid, RatingAggregate>, RepoError> {
            let mut out = HashMap::new();
            for tool_id in tool_ids {
                let aggregate = self.aggregate_for(*tool_id).await?;
                if aggregate.count > 0 {
                    out.insert(*tool_id, aggregate);
                }
            }
            Ok(out)
        }
    }

    fn build_service(known_tools: Vec<Uuid>) -> (RatingService, Arc<CatalogStore>) {
        let config = CacheConfig::default();
        let cache = Arc::new(CatalogStore::new(&config));
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            config.clone(),
            cache.clone(),
            queue.clone(),
        ));
        let trigger = Arc::new(CacheTrigger::new(config.clone(), queue, consumer));

        let service = RatingService::new(
            Arc::new(StubToolsRepo { known: known_tools }),
            Arc::new(InMemoryRatingsRepo::default()),
            cache.clone(),
            trigger,
            &config,
        );
        (service, cache)
    }

    fn user() -> Identity {
        Identity::user(Uuid::new_v4())
    }

    #[tokio::test]
    async fn rejects_anonymous_submissions() {
        let tool_id = Uuid::new_v4();
        let (service, _) = build_service(vec![tool_id]);

        let result = service.submit(None, tool_id, 4).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let result = service.user_rating(None, tool_id).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn rejects_out_of_range_values() {
        let tool_id = Uuid::new_v4();
        let (service, _) = build_service(vec![tool_id]);

        for value in [0, 6, -1] {
            let result = service.submit(Some(user()), tool_id, value).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn rejects_unknown_tool() {
        let (service, _) = build_service(Vec::new());

        let result = service.submit(Some(user()), Uuid::new_v4(), 4).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn resubmission_replaces_the_previous_value() {
        let tool_id = Uuid::new_v4();
        let identity = user();
        let (service, _) = build_service(vec![tool_id]);

        service
            .submit(Some(identity), tool_id, 2)
            .await
            .expect("first");
        service
            .submit(Some(identity), tool_id, 5)
            .await
            .expect("second");

        let rating = service
            .user_rating(Some(identity), tool_id)
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(rating.value, 5);
    }

    #[tokio::test]
    async fn submit_invalidates_cached_aggregate_before_returning() {
        let tool_id = Uuid::new_v4();
        let (service, cache) = build_service(vec![tool_id]);

        cache.set_aggregate(
            tool_id,
            RatingAggregate {
                average: 3.0,
                count: 1,
            },
        );

        service
            .submit(Some(user()), tool_id, 5)
            .await
            .expect("submit");

        // The stale aggregate is gone the moment submit returns.
        assert!(cache.get_aggregate(tool_id).is_none());
    }

    #[tokio::test]
    async fn unrated_lookup_is_memoized() {
        let tool_id = Uuid::new_v4();
        let identity = user();
        let (service, cache) = build_service(vec![tool_id]);

        let rating = service
            .user_rating(Some(identity), tool_id)
            .await
            .expect("lookup");
        assert!(rating.is_none());

        // The negative result was cached.
        assert_eq!(cache.get_user_rating(tool_id, identity.id), Some(None));
    }
}
