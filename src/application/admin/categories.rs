//! Admin category management.
//!
//! Categories are a flat directory: create and delete, no nesting. Deleting
//! a category never deletes tools; the storage layer re-points them to no
//! category inside the same transaction.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use crate::application::admin::audit::AdminAuditService;
use crate::application::identity::Identity;
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CreateCategoryParams, RepoError,
};
use crate::cache::CacheTrigger;
use crate::domain::entities::CategoryRecord;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async};

#[derive(Debug, Error)]
pub enum AdminCategoryError {
    #[error("admin privileges required")]
    Unauthorized,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("category not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminCategoryError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

fn require_admin(identity: Option<&Identity>) -> Result<&Identity, AdminCategoryError> {
    match identity {
        Some(identity) if identity.is_admin => Ok(identity),
        _ => Err(AdminCategoryError::Unauthorized),
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryCommand {
    pub name: String,
    pub icon: Option<String>,
}

#[derive(Clone)]
pub struct AdminCategoryService {
    reader: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn CategoriesWriteRepo>,
    audit: AdminAuditService,
    trigger: Arc<CacheTrigger>,
}

impl AdminCategoryService {
    pub fn new(
        reader: Arc<dyn CategoriesRepo>,
        writer: Arc<dyn CategoriesWriteRepo>,
        audit: AdminAuditService,
        trigger: Arc<CacheTrigger>,
    ) -> Self {
        Self {
            reader,
            writer,
            audit,
            trigger,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<CategoryRecord>, AdminCategoryError> {
        self.reader.list_all().await.map_err(AdminCategoryError::from)
    }

    #[instrument(skip(self, identity, command), fields(name = %command.name))]
    pub async fn create_category(
        &self,
        identity: Option<&Identity>,
        command: CreateCategoryCommand,
    ) -> Result<CategoryRecord, AdminCategoryError> {
        let actor = require_admin(identity)?.id.to_string();

        let name = command.name.trim().to_string();
        if name.is_empty() {
            return Err(AdminCategoryError::validation("`name` is required"));
        }

        let icon = command.icon.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        });

        let reader = self.reader.clone();
        let slug = match generate_unique_slug_async(&name, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await
        {
            Ok(slug) => slug,
            Err(SlugAsyncError::Slug(SlugError::EmptyInput | SlugError::Unrepresentable { .. })) => {
                return Err(AdminCategoryError::validation(
                    "name does not yield a usable slug",
                ));
            }
            Err(SlugAsyncError::Slug(SlugError::Exhausted { base })) => {
                return Err(AdminCategoryError::validation(format!(
                    "no free slug near `{base}`"
                )));
            }
            Err(SlugAsyncError::Predicate(err)) => return Err(AdminCategoryError::Repo(err)),
        };

        let category = self
            .writer
            .create_category(CreateCategoryParams { slug, name, icon })
            .await?;

        let snapshot = CategorySnapshot {
            slug: category.slug.as_str(),
            name: category.name.as_str(),
        };
        self.audit
            .record(
                &actor,
                "category.create",
                "category",
                Some(&category.id.to_string()),
                Some(&snapshot),
            )
            .await?;

        self.trigger.category_upserted(category.id).await;

        Ok(category)
    }

    /// Delete a category. Tools filed under it are re-pointed to no
    /// category, not deleted.
    #[instrument(skip(self, identity))]
    pub async fn delete_category(
        &self,
        identity: Option<&Identity>,
        id: Uuid,
    ) -> Result<(), AdminCategoryError> {
        let actor = require_admin(identity)?.id.to_string();

        if self.reader.find_by_id(id).await?.is_none() {
            return Err(AdminCategoryError::NotFound);
        }

        self.writer.delete_category(id).await?;

        self.audit
            .record(
                &actor,
                "category.delete",
                "category",
                Some(&id.to_string()),
                Option::<&CategorySnapshot>::None,
            )
            .await?;

        self.trigger.category_deleted(id).await;

        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CategorySnapshot<'a> {
    slug: &'a str,
    name: &'a str,
}
