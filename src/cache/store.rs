//! Cache storage for the catalog read models.
//!
//! One in-process store holds categories, tool lookups, memoized list
//! results, rating aggregates, and per-user rating lookups. Everything here
//! is LRU-bounded except the category listing, which is a single slot.

use std::sync::RwLock;

use lru::LruCache;
use uuid::Uuid;

use crate::domain::entities::{CatalogEntry, CategoryRecord, RatingAggregate, RatingRecord, ToolListing};

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// In-memory object cache for catalog queries.
///
/// Read paths consult this store before the database; write paths never
/// touch it directly and go through event-driven invalidation instead.
pub struct CatalogStore {
    // Singleton (no eviction needed)
    categories: RwLock<Option<Vec<CategoryRecord>>>,

    // KV caches (with LRU eviction)
    tools_by_id: RwLock<LruCache<Uuid, ToolListing>>,
    tools_by_slug: RwLock<LruCache<String, ToolListing>>,
    aggregates: RwLock<LruCache<Uuid, RatingAggregate>>,
    // Caches negative lookups too: `None` means "this user has not rated".
    user_ratings: RwLock<LruCache<(Uuid, Uuid), Option<RatingRecord>>>,

    // List cache keyed by request-shape hash
    tool_lists: RwLock<LruCache<u64, Vec<CatalogEntry>>>,
}

impl CatalogStore {
    /// Create a new store with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            categories: RwLock::new(None),
            tools_by_id: RwLock::new(LruCache::new(config.tool_limit_non_zero())),
            tools_by_slug: RwLock::new(LruCache::new(config.tool_limit_non_zero())),
            aggregates: RwLock::new(LruCache::new(config.aggregate_limit_non_zero())),
            user_ratings: RwLock::new(LruCache::new(config.user_rating_limit_non_zero())),
            tool_lists: RwLock::new(LruCache::new(config.list_limit_non_zero())),
        }
    }

    // ========================================================================
    // Category listing
    // ========================================================================

    pub fn get_categories(&self) -> Option<Vec<CategoryRecord>> {
        rw_read(&self.categories, SOURCE, "get_categories").clone()
    }

    pub fn set_categories(&self, value: Vec<CategoryRecord>) {
        *rw_write(&self.categories, SOURCE, "set_categories") = Some(value);
    }

    pub fn invalidate_categories(&self) {
        *rw_write(&self.categories, SOURCE, "invalidate_categories") = None;
    }

    // ========================================================================
    // Tool KV cache
    // ========================================================================

    pub fn get_tool_by_id(&self, id: Uuid) -> Option<ToolListing> {
        rw_write(&self.tools_by_id, SOURCE, "get_tool_by_id")
            .get(&id)
            .cloned()
    }

    pub fn get_tool_by_slug(&self, slug: &str) -> Option<ToolListing> {
        rw_write(&self.tools_by_slug, SOURCE, "get_tool_by_slug")
            .get(slug)
            .cloned()
    }

    pub fn set_tool(&self, listing: ToolListing) {
        let mut by_id = rw_write(&self.tools_by_id, SOURCE, "set_tool.by_id");
        let mut by_slug = rw_write(&self.tools_by_slug, SOURCE, "set_tool.by_slug");
        by_id.put(listing.tool.id, listing.clone());
        by_slug.put(listing.tool.slug.clone(), listing);
    }

    pub fn invalidate_tool(&self, id: Uuid, slug: &str) {
        rw_write(&self.tools_by_id, SOURCE, "invalidate_tool.by_id").pop(&id);
        rw_write(&self.tools_by_slug, SOURCE, "invalidate_tool.by_slug").pop(slug);
    }

    pub fn invalidate_tool_slug(&self, slug: &str) {
        let popped = rw_write(&self.tools_by_slug, SOURCE, "invalidate_tool_slug").pop(slug);
        if let Some(listing) = popped {
            rw_write(&self.tools_by_id, SOURCE, "invalidate_tool_slug.by_id")
                .pop(&listing.tool.id);
        }
    }

    pub fn invalidate_all_tools(&self) {
        rw_write(&self.tools_by_id, SOURCE, "invalidate_all_tools.by_id").clear();
        rw_write(&self.tools_by_slug, SOURCE, "invalidate_all_tools.by_slug").clear();
    }

    // ========================================================================
    // Rating aggregate cache
    // ========================================================================

    pub fn get_aggregate(&self, tool_id: Uuid) -> Option<RatingAggregate> {
        rw_write(&self.aggregates, SOURCE, "get_aggregate")
            .get(&tool_id)
            .copied()
    }

    pub fn set_aggregate(&self, tool_id: Uuid, aggregate: RatingAggregate) {
        rw_write(&self.aggregates, SOURCE, "set_aggregate").put(tool_id, aggregate);
    }

    pub fn invalidate_aggregate(&self, tool_id: Uuid) {
        rw_write(&self.aggregates, SOURCE, "invalidate_aggregate").pop(&tool_id);
    }

    // ========================================================================
    // Per-user rating cache
    // ========================================================================

    /// Outer `None` = cache miss; inner `None` = known-unrated.
    pub fn get_user_rating(&self, tool_id: Uuid, user_id: Uuid) -> Option<Option<RatingRecord>> {
        rw_write(&self.user_ratings, SOURCE, "get_user_rating")
            .get(&(tool_id, user_id))
            .cloned()
    }

    pub fn set_user_rating(&self, tool_id: Uuid, user_id: Uuid, rating: Option<RatingRecord>) {
        rw_write(&self.user_ratings, SOURCE, "set_user_rating").put((tool_id, user_id), rating);
    }

    pub fn invalidate_user_rating(&self, tool_id: Uuid, user_id: Uuid) {
        rw_write(&self.user_ratings, SOURCE, "invalidate_user_rating").pop(&(tool_id, user_id));
    }

    pub fn invalidate_all_user_ratings(&self) {
        rw_write(&self.user_ratings, SOURCE, "invalidate_all_user_ratings").clear();
    }

    // ========================================================================
    // Tool list cache
    // ========================================================================

    pub fn get_tool_list(&self, request_hash: u64) -> Option<Vec<CatalogEntry>> {
        rw_write(&self.tool_lists, SOURCE, "get_tool_list")
            .get(&request_hash)
            .cloned()
    }

    pub fn set_tool_list(&self, request_hash: u64, entries: Vec<CatalogEntry>) {
        rw_write(&self.tool_lists, SOURCE, "set_tool_list").put(request_hash, entries);
    }

    pub fn invalidate_all_tool_lists(&self) {
        rw_write(&self.tool_lists, SOURCE, "invalidate_all_tool_lists").clear();
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Clear all cached data.
    pub fn clear(&self) {
        self.invalidate_categories();
        self.invalidate_all_tools();
        rw_write(&self.aggregates, SOURCE, "clear.aggregates").clear();
        self.invalidate_all_user_ratings();
        self.invalidate_all_tool_lists();
    }
}
