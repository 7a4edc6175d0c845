//! Admin tool management.
//!
//! Create, update, and delete flow for catalog tools. Each mutation commits,
//! writes an audit entry, then invalidates the affected cache entries before
//! returning, so admin screens and the public catalog re-read fresh state.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::application::admin::audit::AdminAuditService;
use crate::application::identity::Identity;
use crate::application::repos::{
    CategoriesRepo, CreateToolParams, RepoError, ToolListScope, ToolQueryFilter, ToolsRepo,
    ToolsWriteRepo, UpdateToolParams,
};
use crate::cache::CacheTrigger;
use crate::domain::entities::{ToolListing, ToolRecord};
use crate::domain::slug::{self, SlugAsyncError, SlugError, generate_unique_slug_async};
use crate::domain::types::{SharedAccess, ToolStatus};

const MAX_SHORT_DESCRIPTION_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum AdminToolError {
    #[error("admin privileges required")]
    Unauthorized,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("tool not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl AdminToolError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

fn require_admin(identity: Option<&Identity>) -> Result<&Identity, AdminToolError> {
    match identity {
        Some(identity) if identity.is_admin => Ok(identity),
        _ => Err(AdminToolError::Unauthorized),
    }
}

#[derive(Debug, Clone)]
pub struct CreateToolCommand {
    pub name: String,
    /// Explicit slug, or `None` to derive one from the name. An explicit
    /// slug must be canonical and free; a derived one is suffixed into
    /// uniqueness.
    pub slug: Option<String>,
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
pub struct UpdateToolCommand {
    pub id: Uuid,
    pub name: String,
    /// `None` keeps the current slug.
    pub slug: Option<String>,
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

#[derive(Clone)]
pub struct AdminToolService {
    reader: Arc<dyn ToolsRepo>,
    categories: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn ToolsWriteRepo>,
    audit: AdminAuditService,
    trigger: Arc<CacheTrigger>,
}

impl AdminToolService {
    pub fn new(
        reader: Arc<dyn ToolsRepo>,
        categories: Arc<dyn CategoriesRepo>,
        writer: Arc<dyn ToolsWriteRepo>,
        audit: AdminAuditService,
        trigger: Arc<CacheTrigger>,
    ) -> Self {
        Self {
            reader,
            categories,
            writer,
            audit,
            trigger,
        }
    }

    /// Every tool regardless of status, for the admin listing.
    pub async fn list_all(&self) -> Result<Vec<ToolListing>, AdminToolError> {
        self.reader
            .list_tools(ToolListScope::Admin, &ToolQueryFilter::default())
            .await
            .map_err(AdminToolError::from)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ToolRecord>, AdminToolError> {
        self.reader.find_by_id(id).await.map_err(AdminToolError::from)
    }

    #[instrument(skip(self, identity, command), fields(name = %command.name))]
    pub async fn create_tool(
        &self,
        identity: Option<&Identity>,
        command: CreateToolCommand,
    ) -> Result<ToolRecord, AdminToolError> {
        let actor = require_admin(identity)?.id.to_string();

        let name = required_trimmed(&command.name, "name")?;
        let short_description = validate_short_description(&command.short_description)?;
        let website_url = validate_url(&command.website_url)?;
        let shared_access = validate_shared_access(command.shared_access)?;
        self.ensure_category_exists(command.category_id).await?;

        let slug = self.settle_slug(command.slug.as_deref(), &name, None).await?;

        let params = CreateToolParams {
            slug,
            name,
            short_description,
            full_description: optional_trimmed(command.full_description),
            category_id: command.category_id,
            website_url,
            cover_image: optional_trimmed(command.cover_image),
            logo_image: optional_trimmed(command.logo_image),
            featured: command.featured,
            status: command.status,
            shared_access,
        };

        let tool = self.writer.create_tool(params).await?;

        let snapshot = ToolSnapshot {
            slug: tool.slug.as_str(),
            name: tool.name.as_str(),
            status: tool.status.as_str(),
        };
        self.audit
            .record(
                &actor,
                "tool.create",
                "tool",
                Some(&tool.id.to_string()),
                Some(&snapshot),
            )
            .await?;

        self.trigger.tool_upserted(tool.id, &tool.slug, None).await;

        Ok(tool)
    }

    #[instrument(skip(self, identity, command), fields(tool_id = %command.id))]
    pub async fn update_tool(
        &self,
        identity: Option<&Identity>,
        command: UpdateToolCommand,
    ) -> Result<ToolRecord, AdminToolError> {
        let actor = require_admin(identity)?.id.to_string();

        let name = required_trimmed(&command.name, "name")?;
        let short_description = validate_short_description(&command.short_description)?;
        let website_url = validate_url(&command.website_url)?;
        let shared_access = validate_shared_access(command.shared_access)?;
        self.ensure_category_exists(command.category_id).await?;

        let existing = self
            .reader
            .find_by_id(command.id)
            .await?
            .ok_or(AdminToolError::NotFound)?;

        let slug = match command.slug.as_deref() {
            Some(explicit) if explicit != existing.slug => {
                self.settle_slug(Some(explicit), &name, Some(command.id))
                    .await?
            }
            _ => existing.slug.clone(),
        };
        let previous_slug = (slug != existing.slug).then(|| existing.slug.clone());

        let params = UpdateToolParams {
            id: command.id,
            slug,
            name,
            short_description,
            full_description: optional_trimmed(command.full_description),
            category_id: command.category_id,
            website_url,
            cover_image: optional_trimmed(command.cover_image),
            logo_image: optional_trimmed(command.logo_image),
            featured: command.featured,
            status: command.status,
            shared_access,
        };

        let tool = self.writer.update_tool(params).await?;

        let snapshot = ToolSnapshot {
            slug: tool.slug.as_str(),
            name: tool.name.as_str(),
            status: tool.status.as_str(),
        };
        self.audit
            .record(
                &actor,
                "tool.update",
                "tool",
                Some(&tool.id.to_string()),
                Some(&snapshot),
            )
            .await?;

        self.trigger
            .tool_upserted(tool.id, &tool.slug, previous_slug.as_deref())
            .await;

        Ok(tool)
    }

    #[instrument(skip(self, identity))]
    pub async fn delete_tool(
        &self,
        identity: Option<&Identity>,
        id: Uuid,
    ) -> Result<(), AdminToolError> {
        let actor = require_admin(identity)?.id.to_string();

        let existing = self
            .reader
            .find_by_id(id)
            .await?
            .ok_or(AdminToolError::NotFound)?;

        self.writer.delete_tool(id).await?;

        self.audit
            .record(
                &actor,
                "tool.delete",
                "tool",
                Some(&id.to_string()),
                Option::<&ToolSnapshot>::None,
            )
            .await?;

        self.trigger.tool_deleted(id, &existing.slug).await;

        Ok(())
    }

    async fn ensure_category_exists(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<(), AdminToolError> {
        if let Some(id) = category_id
            && self.categories.find_by_id(id).await?.is_none()
        {
            return Err(AdminToolError::validation(format!(
                "category `{id}` does not exist"
            )));
        }
        Ok(())
    }

    /// Resolve the final slug for a create or update.
    ///
    /// Explicit slugs fail fast when malformed or taken; derived slugs are
    /// retried with a numeric suffix until free. `own_id` excludes the tool
    /// being updated from the collision check.
    async fn settle_slug(
        &self,
        explicit: Option<&str>,
        name: &str,
        own_id: Option<Uuid>,
    ) -> Result<String, AdminToolError> {
        if let Some(explicit) = explicit {
            let explicit = explicit.trim();
            if !slug::is_canonical(explicit) {
                return Err(AdminToolError::validation(format!(
                    "slug `{explicit}` is not in canonical form"
                )));
            }
            let taken = match self.reader.find_by_slug(explicit).await? {
                Some(listing) => Some(listing.tool.id) != own_id,
                None => false,
            };
            if taken {
                return Err(AdminToolError::validation(format!(
                    "slug `{explicit}` is already taken"
                )));
            }
            return Ok(explicit.to_string());
        }

        let reader = self.reader.clone();
        match generate_unique_slug_async(name, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader.find_by_slug(&candidate).await.map(|existing| {
                    match existing {
                        Some(listing) => Some(listing.tool.id) == own_id,
                        None => true,
                    }
                })
            }
        })
        .await
        {
            Ok(slug) => Ok(slug),
            Err(SlugAsyncError::Slug(SlugError::EmptyInput | SlugError::Unrepresentable { .. })) => {
                Err(AdminToolError::validation(
                    "name does not yield a usable slug",
                ))
            }
            Err(SlugAsyncError::Slug(SlugError::Exhausted { base })) => Err(
                AdminToolError::validation(format!("no free slug near `{base}`")),
            ),
            Err(SlugAsyncError::Predicate(err)) => Err(AdminToolError::Repo(err)),
        }
    }
}

#[derive(Debug, Serialize)]
struct ToolSnapshot<'a> {
    slug: &'a str,
    name: &'a str,
    status: &'a str,
}

fn required_trimmed(value: &str, field: &'static str) -> Result<String, AdminToolError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdminToolError::validation(format!("`{field}` is required")));
    }
    Ok(trimmed.to_string())
}

fn validate_short_description(value: &str) -> Result<String, AdminToolError> {
    let trimmed = required_trimmed(value, "short_description")?;
    if trimmed.chars().count() > MAX_SHORT_DESCRIPTION_CHARS {
        return Err(AdminToolError::validation(format!(
            "short_description must be at most {MAX_SHORT_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

fn optional_trimmed(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn validate_url(value: &str) -> Result<String, AdminToolError> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed)
        .map_err(|err| AdminToolError::validation(format!("website_url is invalid: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AdminToolError::validation(
            "website_url must use http or https",
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_shared_access(access: SharedAccess) -> Result<SharedAccess, AdminToolError> {
    if let SharedAccess::Enabled { email, .. } = &access
        && email.trim().is_empty()
    {
        return Err(AdminToolError::validation(
            "shared access requires a contact email",
        ));
    }
    Ok(access)
}
