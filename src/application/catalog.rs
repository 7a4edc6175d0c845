//! Catalog query engine.
//!
//! Read-through services for tool listings, tool detail, and the category
//! directory. Every read consults the in-process cache first and memoizes
//! what it had to fetch; mutations elsewhere invalidate through the event
//! queue so these paths never serve stale data after a committed write.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::cache::{CacheConfig, CatalogStore, hash_list_request};
use crate::domain::entities::{CatalogEntry, CategoryRecord, RatingAggregate, ToolListing};
use crate::domain::types::ToolStatus;

use super::error::AppError;
use super::repos::{CategoriesRepo, RatingsRepo, ToolListScope, ToolQueryFilter, ToolsRepo};

const METRIC_CACHE_HITS: &str = "vetrina_cache_hits_total";
const METRIC_CACHE_MISSES: &str = "vetrina_cache_misses_total";

/// A catalog list request as callers express it: category by slug, free-text
/// search. Blank strings are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub category_slug: Option<String>,
    pub search: Option<String>,
}

impl CatalogQuery {
    fn normalized(self) -> Self {
        let clean = |value: Option<String>| {
            value.and_then(|v| {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };
        Self {
            category_slug: clean(self.category_slug),
            search: clean(self.search),
        }
    }
}

/// Read-side service over tools, categories, and rating aggregates.
#[derive(Clone)]
pub struct CatalogService {
    tools: Arc<dyn ToolsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    ratings: Arc<dyn RatingsRepo>,
    cache: Arc<CatalogStore>,
    cache_enabled: bool,
}

impl CatalogService {
    pub fn new(
        tools: Arc<dyn ToolsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        ratings: Arc<dyn RatingsRepo>,
        cache: Arc<CatalogStore>,
        cache_config: &CacheConfig,
    ) -> Self {
        Self {
            tools,
            categories,
            ratings,
            cache,
            cache_enabled: cache_config.enabled,
        }
    }

    /// List tools for the given scope, enriched with rating aggregates.
    ///
    /// Ordering is featured-first, then newest-first, stable across ties.
    /// An unknown category slug yields an empty list rather than an error,
    /// so a stale link filters to nothing instead of breaking the page.
    #[instrument(skip(self))]
    pub async fn list_tools(
        &self,
        scope: ToolListScope,
        query: CatalogQuery,
    ) -> Result<Vec<CatalogEntry>, AppError> {
        let query = query.normalized();

        let category = match &query.category_slug {
            Some(slug) => match self.resolve_category(slug).await? {
                Some(category) => Some(category.id),
                None => {
                    debug!(category_slug = %slug, "Unknown category slug, returning empty list");
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        let filter = ToolQueryFilter {
            category,
            search: query.search,
        };
        let request_hash = hash_list_request(scope, &filter);

        if self.cache_enabled
            && let Some(entries) = self.cache.get_tool_list(request_hash)
        {
            counter!(METRIC_CACHE_HITS, "surface" => "tool_list").increment(1);
            return Ok(entries);
        }
        counter!(METRIC_CACHE_MISSES, "surface" => "tool_list").increment(1);

        let listings = self.tools.list_tools(scope, &filter).await?;
        let tool_ids: Vec<Uuid> = listings.iter().map(|l| l.tool.id).collect();
        let aggregates = self.ratings.aggregate_for_many(&tool_ids).await?;

        let entries: Vec<CatalogEntry> = listings
            .into_iter()
            .map(|listing| {
                let rating = aggregates
                    .get(&listing.tool.id)
                    .copied()
                    .unwrap_or(RatingAggregate::EMPTY);
                CatalogEntry::from_listing(listing, rating)
            })
            .collect();

        if self.cache_enabled {
            self.cache.set_tool_list(request_hash, entries.clone());
        }

        Ok(entries)
    }

    /// Fetch one published tool by slug, with its rating aggregate.
    ///
    /// Draft tools are invisible here; the admin surface reads through the
    /// repositories directly.
    #[instrument(skip(self))]
    pub async fn get_tool(&self, slug: &str) -> Result<Option<CatalogEntry>, AppError> {
        let Some(listing) = self.lookup_tool(slug).await? else {
            return Ok(None);
        };

        if listing.tool.status != ToolStatus::Published {
            return Ok(None);
        }

        let rating = self.rating_aggregate(listing.tool.id).await?;
        Ok(Some(CatalogEntry::from_listing(listing, rating)))
    }

    /// All categories, ordered by name.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, AppError> {
        if self.cache_enabled
            && let Some(categories) = self.cache.get_categories()
        {
            counter!(METRIC_CACHE_HITS, "surface" => "categories").increment(1);
            return Ok(categories);
        }
        counter!(METRIC_CACHE_MISSES, "surface" => "categories").increment(1);

        let categories = self.categories.list_all().await?;
        if self.cache_enabled {
            self.cache.set_categories(categories.clone());
        }
        Ok(categories)
    }

    /// The (mean, count) rating aggregate for one tool. Unrated tools yield
    /// the zero aggregate.
    pub async fn rating_aggregate(&self, tool_id: Uuid) -> Result<RatingAggregate, AppError> {
        if self.cache_enabled
            && let Some(aggregate) = self.cache.get_aggregate(tool_id)
        {
            counter!(METRIC_CACHE_HITS, "surface" => "aggregate").increment(1);
            return Ok(aggregate);
        }
        counter!(METRIC_CACHE_MISSES, "surface" => "aggregate").increment(1);

        let aggregate = self.ratings.aggregate_for(tool_id).await?;
        if self.cache_enabled {
            self.cache.set_aggregate(tool_id, aggregate);
        }
        Ok(aggregate)
    }

    async fn resolve_category(&self, slug: &str) -> Result<Option<CategoryRecord>, AppError> {
        // Resolve through the cached category listing so the common path
        // costs no extra query.
        let categories = self.list_categories().await?;
        Ok(categories.into_iter().find(|c| c.slug == slug))
    }

    async fn lookup_tool(&self, slug: &str) -> Result<Option<ToolListing>, AppError> {
        if self.cache_enabled
            && let Some(listing) = self.cache.get_tool_by_slug(slug)
        {
            counter!(METRIC_CACHE_HITS, "surface" => "tool").increment(1);
            return Ok(Some(listing));
        }
        counter!(METRIC_CACHE_MISSES, "surface" => "tool").increment(1);

        let listing = self.tools.find_by_slug(slug).await?;
        if self.cache_enabled
            && let Some(listing) = &listing
        {
            self.cache.set_tool(listing.clone());
        }
        Ok(listing)
    }
}
