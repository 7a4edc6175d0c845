//! Repository traits describing persistence adapters.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::entities::{
    AuditLogRecord, CategoryRecord, RatingAggregate, RatingRecord, ToolListing, ToolRecord,
};
use crate::domain::types::{SharedAccess, ToolStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Visibility scope for catalog listings.
///
/// Public listings pin `status = published`; the admin scope sees every
/// status so draft entries can be managed before they go live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolListScope {
    Public,
    Admin,
}

/// Filter predicates composed onto a tool listing, combined with AND.
/// `category` is a resolved category id; slug resolution happens upstream so
/// an unknown slug can soft-fail to an empty result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ToolQueryFilter {
    pub category: Option<Uuid>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateToolParams {
    pub slug: String,
    pub name: String,
    pub short_description: String,
    pub full_description: Option<String>,
    pub category_id: Option<Uuid>,
    pub website_url: String,
    pub cover_image: Option<String>,
    pub logo_image: Option<String>,
    pub featured: bool,
    pub status: ToolStatus,
    pub shared_access: SharedAccess,
}

#[derive(Debug, Clone)]
pub struct UpdateToolParams {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub short_description: String,
    pub full_description: Option<String>,
    pub category_id: Option<Uuid>,
    pub website_url: String,
    pub cover_image: Option<String>,
    pub logo_image: Option<String>,
    pub featured: bool,
    pub status: ToolStatus,
    pub shared_access: SharedAccess,
}

#[async_trait]
pub trait ToolsRepo: Send + Sync {
    /// List tools joined with their category, ordered featured-first then by
    /// recency with a stable id tie-break.
    async fn list_tools(
        &self,
        scope: ToolListScope,
        filter: &ToolQueryFilter,
    ) -> Result<Vec<ToolListing>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ToolListing>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ToolRecord>, RepoError>;
}

#[async_trait]
pub trait ToolsWriteRepo: Send + Sync {
    async fn create_tool(&self, params: CreateToolParams) -> Result<ToolRecord, RepoError>;

    async fn update_tool(&self, params: UpdateToolParams) -> Result<ToolRecord, RepoError>;

    async fn delete_tool(&self, id: Uuid) -> Result<(), RepoError>;
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub slug: String,
    pub name: String,
    pub icon: Option<String>,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// All categories ordered by name.
    async fn list_all(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait CategoriesWriteRepo: Send + Sync {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    /// Delete a category, clearing `category_id` on any tools that still
    /// reference it (cascade-null) within the same transaction.
    async fn delete_category(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait RatingsRepo: Send + Sync {
    /// Insert or replace the rating for (tool, user).
    ///
    /// Must be atomic per key: two concurrent submissions for the same pair
    /// resolve to a single row holding one of the submitted values, never a
    /// duplicate row and never a surfaced conflict.
    async fn upsert_rating(
        &self,
        tool_id: Uuid,
        user_id: Uuid,
        value: i16,
    ) -> Result<RatingRecord, RepoError>;

    async fn find_user_rating(
        &self,
        tool_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RatingRecord>, RepoError>;

    /// (mean, count) over all ratings of one tool; `(0.0, 0)` when unrated.
    async fn aggregate_for(&self, tool_id: Uuid) -> Result<RatingAggregate, RepoError>;

    /// Batch aggregation for a listing page. Tools without ratings are
    /// absent from the map; callers fill in `RatingAggregate::EMPTY`.
    async fn aggregate_for_many(
        &self,
        tool_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RatingAggregate>, RepoError>;
}

#[async_trait]
pub trait AuditRepo: Send + Sync {
    async fn append_log(&self, record: AuditLogRecord) -> Result<(), RepoError>;

    async fn list_recent(&self, limit: u32) -> Result<Vec<AuditLogRecord>, RepoError>;
}
