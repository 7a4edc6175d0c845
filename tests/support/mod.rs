//! In-memory repository backend for exercising the assembled services
//! without a database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use vetrina::application::repos::{
    AuditRepo, CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, CreateToolParams,
    RatingsRepo, RepoError, ToolListScope, ToolQueryFilter, ToolsRepo, ToolsWriteRepo,
    UpdateToolParams,
};
use vetrina::cache::CacheConfig;
use vetrina::domain::entities::{
    AuditLogRecord, CategoryRecord, RatingAggregate, RatingRecord, ToolListing, ToolRecord,
};
use vetrina::domain::types::ToolStatus;
use vetrina::{Directory, Repositories};

#[derive(Default)]
struct State {
    tools: Vec<ToolRecord>,
    categories: Vec<CategoryRecord>,
    ratings: Vec<RatingRecord>,
    audit: Vec<AuditLogRecord>,
}

/// One backing store implementing every repository trait, the way the
/// Postgres adapter does. Creation timestamps advance monotonically so
/// recency ordering is deterministic.
pub struct InMemoryBackend {
    state: Mutex<State>,
    tick: AtomicI64,
    pub list_calls: AtomicUsize,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            tick: AtomicI64::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    fn next_timestamp(&self) -> OffsetDateTime {
        let tick = self.tick.fetch_add(1, Ordering::Relaxed);
        OffsetDateTime::from_unix_timestamp(1_700_000_000 + tick).expect("valid timestamp")
    }

    fn listing_for(state: &State, tool: &ToolRecord) -> ToolListing {
        let category = tool.category_id.and_then(|id| {
            state
                .categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.clone().into())
        });
        ToolListing {
            tool: tool.clone(),
            category,
        }
    }

    fn matches(tool: &ToolRecord, scope: ToolListScope, filter: &ToolQueryFilter) -> bool {
        if scope == ToolListScope::Public && tool.status != ToolStatus::Published {
            return false;
        }
        if let Some(category) = filter.category
            && tool.category_id != Some(category)
        {
            return false;
        }
        if let Some(search) = filter.search.as_ref() {
            let needle = search.to_lowercase();
            let hit = tool.name.to_lowercase().contains(&needle)
                || tool.short_description.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl ToolsRepo for InMemoryBackend {
    async fn list_tools(
        &self,
        scope: ToolListScope,
        filter: &ToolQueryFilter,
    ) -> Result<Vec<ToolListing>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.state.lock().expect("state lock");
        let mut tools: Vec<&ToolRecord> = state
            .tools
            .iter()
            .filter(|tool| Self::matches(tool, scope, filter))
            .collect();
        tools.sort_by(|a, b| {
            b.featured
                .cmp(&a.featured)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(tools
            .into_iter()
            .map(|tool| Self::listing_for(&state, tool))
            .collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ToolListing>, RepoError> {
        let state = self.state.lock().expect("state lock");
        Ok(state
            .tools
            .iter()
            .find(|tool| tool.slug == slug)
            .map(|tool| Self::listing_for(&state, tool)))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ToolRecord>, RepoError> {
        let state = self.state.lock().expect("state lock");
        Ok(state.tools.iter().find(|tool| tool.id == id).cloned())
    }
}

#[async_trait]
impl ToolsWriteRepo for InMemoryBackend {
    async fn create_tool(&self, params: CreateToolParams) -> Result<ToolRecord, RepoError> {
        let created_at = self.next_timestamp();
        let mut state = self.state.lock().expect("state lock");
        if state.tools.iter().any(|tool| tool.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "tools_slug_key".to_string(),
            });
        }
        let record = ToolRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            name: params.name,
            short_description: params.short_description,
            full_description: params.full_description,
            category_id: params.category_id,
            website_url: params.website_url,
            cover_image: params.cover_image,
            logo_image: params.logo_image,
            featured: params.featured,
            status: params.status,
            shared_access: params.shared_access,
            created_at,
        };
        state.tools.push(record.clone());
        Ok(record)
    }

    async fn update_tool(&self, params: UpdateToolParams) -> Result<ToolRecord, RepoError> {
        let mut state = self.state.lock().expect("state lock");
        if state
            .tools
            .iter()
            .any(|tool| tool.slug == params.slug && tool.id != params.id)
        {
            return Err(RepoError::Duplicate {
                constraint: "tools_slug_key".to_string(),
            });
        }
        let tool = state
            .tools
            .iter_mut()
            .find(|tool| tool.id == params.id)
            .ok_or(RepoError::NotFound)?;
        tool.slug = params.slug;
        tool.name = params.name;
        tool.short_description = params.short_description;
        tool.full_description = params.full_description;
        tool.category_id = params.category_id;
        tool.website_url = params.website_url;
        tool.cover_image = params.cover_image;
        tool.logo_image = params.logo_image;
        tool.featured = params.featured;
        tool.status = params.status;
        tool.shared_access = params.shared_access;
        Ok(tool.clone())
    }

    async fn delete_tool(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.lock().expect("state lock");
        let before = state.tools.len();
        state.tools.retain(|tool| tool.id != id);
        if state.tools.len() == before {
            return Err(RepoError::NotFound);
        }
        state.ratings.retain(|rating| rating.tool_id != id);
        Ok(())
    }
}

#[async_trait]
impl CategoriesRepo for InMemoryBackend {
    async fn list_all(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let state = self.state.lock().expect("state lock");
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(categories)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>, RepoError> {
        let state = self.state.lock().expect("state lock");
        Ok(state.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError> {
        let state = self.state.lock().expect("state lock");
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }
}

#[async_trait]
impl CategoriesWriteRepo for InMemoryBackend {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let created_at = self.next_timestamp();
        let mut state = self.state.lock().expect("state lock");
        if state.categories.iter().any(|c| c.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "categories_slug_key".to_string(),
            });
        }
        let record = CategoryRecord {
            id: Uuid::new_v4(),
            name: params.name,
            slug: params.slug,
            icon: params.icon,
            created_at,
        };
        state.categories.push(record.clone());
        Ok(record)
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError> {
        let mut state = self.state.lock().expect("state lock");
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        if state.categories.len() == before {
            return Err(RepoError::NotFound);
        }
        for tool in state
            .tools
            .iter_mut()
            .filter(|tool| tool.category_id == Some(id))
        {
            tool.category_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl RatingsRepo for InMemoryBackend {
    async fn upsert_rating(
        &self,
        tool_id: Uuid,
        user_id: Uuid,
        value: i16,
    ) -> Result<RatingRecord, RepoError> {
        let now = self.next_timestamp();
        let mut state = self.state.lock().expect("state lock");
        if let Some(rating) = state
            .ratings
            .iter_mut()
            .find(|r| r.tool_id == tool_id && r.user_id == user_id)
        {
            rating.value = value;
            rating.updated_at = now;
            return Ok(rating.clone());
        }
        let record = RatingRecord {
            id: Uuid::new_v4(),
            tool_id,
            user_id,
            value,
            created_at: now,
            updated_at: now,
        };
        state.ratings.push(record.clone());
        Ok(record)
    }

    async fn find_user_rating(
        &self,
        tool_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RatingRecord>, RepoError> {
        let state = self.state.lock().expect("state lock");
        Ok(state
            .ratings
            .iter()
            .find(|r| r.tool_id == tool_id && r.user_id == user_id)
            .cloned())
    }

    async fn aggregate_for(&self, tool_id: Uuid) -> Result<RatingAggregate, RepoError> {
        let state = self.state.lock().expect("state lock");
        Ok(aggregate(&state.ratings, tool_id))
    }

    async fn aggregate_for_many(
        &self,
        tool_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RatingAggregate>, RepoError> {
        let state = self.state.lock().expect("state lock");
        Ok(tool_ids
            .iter()
            .filter_map(|id| {
                let agg = aggregate(&state.ratings, *id);
                (agg.count > 0).then_some((*id, agg))
            })
            .collect())
    }
}

fn aggregate(ratings: &[RatingRecord], tool_id: Uuid) -> RatingAggregate {
    let values: Vec<i16> = ratings
        .iter()
        .filter(|r| r.tool_id == tool_id)
        .map(|r| r.value)
        .collect();
    if values.is_empty() {
        return RatingAggregate::EMPTY;
    }
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    RatingAggregate {
        average: sum as f64 / values.len() as f64,
        count: values.len() as u64,
    }
}

#[async_trait]
impl AuditRepo for InMemoryBackend {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError> {
        let mut state = self.state.lock().expect("state lock");
        state.audit.push(record);
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogRecord>, RepoError> {
        let state = self.state.lock().expect("state lock");
        let mut logs = state.audit.clone();
        logs.reverse();
        logs.truncate(limit as usize);
        Ok(logs)
    }
}

/// Assemble the full service stack over one in-memory backend.
pub fn directory() -> (Arc<InMemoryBackend>, Directory) {
    directory_with(CacheConfig::default())
}

pub fn directory_with(cache_config: CacheConfig) -> (Arc<InMemoryBackend>, Directory) {
    let backend = Arc::new(InMemoryBackend::new());
    let repos = Repositories {
        tools: backend.clone(),
        tools_write: backend.clone(),
        categories: backend.clone(),
        categories_write: backend.clone(),
        ratings: backend.clone(),
        audit: backend.clone(),
    };
    let directory = Directory::new(repos, cache_config);
    (backend, directory)
}
