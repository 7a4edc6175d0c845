use async_trait::async_trait;
use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreateToolParams, RepoError, ToolListScope, ToolQueryFilter, ToolsRepo, ToolsWriteRepo,
    UpdateToolParams,
};
use crate::domain::entities::{CategoryRef, ToolListing, ToolRecord};
use crate::domain::types::{SharedAccess, ToolStatus};

use super::{PostgresRepositories, TOOLS_LISTING_ORDER, map_sqlx_error};

const TOOL_COLUMNS: &str = "t.id, t.slug, t.name, t.short_description, t.full_description, \
     t.category_id, t.website_url, t.cover_image, t.logo_image, t.featured, t.status, \
     t.shared_enabled, t.shared_email, t.shared_password, t.created_at";

const LISTING_COLUMNS: &str = "t.id, t.slug, t.name, t.short_description, t.full_description, \
     t.category_id, t.website_url, t.cover_image, t.logo_image, t.featured, t.status, \
     t.shared_enabled, t.shared_email, t.shared_password, t.created_at, \
     c.id AS cat_id, c.name AS cat_name, c.slug AS cat_slug";

#[derive(sqlx::FromRow)]
struct ToolRow {
    id: Uuid,
    slug: String,
    name: String,
    short_description: String,
    full_description: Option<String>,
    category_id: Option<Uuid>,
    website_url: String,
    cover_image: Option<String>,
    logo_image: Option<String>,
    featured: bool,
    status: ToolStatus,
    shared_enabled: bool,
    shared_email: Option<String>,
    shared_password: Option<String>,
    created_at: OffsetDateTime,
}

impl From<ToolRow> for ToolRecord {
    fn from(row: ToolRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            short_description: row.short_description,
            full_description: row.full_description,
            category_id: row.category_id,
            website_url: row.website_url,
            cover_image: row.cover_image,
            logo_image: row.logo_image,
            featured: row.featured,
            status: row.status,
            shared_access: SharedAccess::from_columns(
                row.shared_enabled,
                row.shared_email,
                row.shared_password,
            ),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ToolListingRow {
    id: Uuid,
    slug: String,
    name: String,
    short_description: String,
    full_description: Option<String>,
    category_id: Option<Uuid>,
    website_url: String,
    cover_image: Option<String>,
    logo_image: Option<String>,
    featured: bool,
    status: ToolStatus,
    shared_enabled: bool,
    shared_email: Option<String>,
    shared_password: Option<String>,
    created_at: OffsetDateTime,
    cat_id: Option<Uuid>,
    cat_name: Option<String>,
    cat_slug: Option<String>,
}

impl From<ToolListingRow> for ToolListing {
    fn from(row: ToolListingRow) -> Self {
        let category = match (row.cat_id, row.cat_name, row.cat_slug) {
            (Some(id), Some(name), Some(slug)) => Some(CategoryRef { id, name, slug }),
            _ => None,
        };
        Self {
            tool: ToolRecord {
                id: row.id,
                slug: row.slug,
                name: row.name,
                short_description: row.short_description,
                full_description: row.full_description,
                category_id: row.category_id,
                website_url: row.website_url,
                cover_image: row.cover_image,
                logo_image: row.logo_image,
                featured: row.featured,
                status: row.status,
                shared_access: SharedAccess::from_columns(
                    row.shared_enabled,
                    row.shared_email,
                    row.shared_password,
                ),
                created_at: row.created_at,
            },
            category,
        }
    }
}

#[async_trait]
impl ToolsRepo for PostgresRepositories {
    async fn list_tools(
        &self,
        scope: ToolListScope,
        filter: &ToolQueryFilter,
    ) -> Result<Vec<ToolListing>, RepoError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {LISTING_COLUMNS} \
             FROM tools t \
             LEFT JOIN categories c ON c.id = t.category_id \
             WHERE 1=1"
        ));

        Self::apply_scope_conditions(&mut qb, scope);
        Self::apply_catalog_filter(&mut qb, filter);
        qb.push(TOOLS_LISTING_ORDER);

        let rows = qb
            .build_query_as::<ToolListingRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ToolListing::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<ToolListing>, RepoError> {
        let row = sqlx::query_as::<_, ToolListingRow>(&format!(
            "SELECT {LISTING_COLUMNS} \
             FROM tools t \
             LEFT JOIN categories c ON c.id = t.category_id \
             WHERE t.slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ToolListing::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ToolRecord>, RepoError> {
        let row = sqlx::query_as::<_, ToolRow>(&format!(
            "SELECT {TOOL_COLUMNS} FROM tools t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ToolRecord::from))
    }
}

#[async_trait]
impl ToolsWriteRepo for PostgresRepositories {
    async fn create_tool(&self, params: CreateToolParams) -> Result<ToolRecord, RepoError> {
        let (shared_enabled, shared_email, shared_password) = params.shared_access.into_columns();

        let row = sqlx::query_as::<_, ToolRow>(&format!(
            "INSERT INTO tools \
                (id, slug, name, short_description, full_description, category_id, \
                 website_url, cover_image, logo_image, featured, status, \
                 shared_enabled, shared_email, shared_password) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {TOOL_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&params.slug)
        .bind(&params.name)
        .bind(&params.short_description)
        .bind(&params.full_description)
        .bind(params.category_id)
        .bind(&params.website_url)
        .bind(&params.cover_image)
        .bind(&params.logo_image)
        .bind(params.featured)
        .bind(params.status)
        .bind(shared_enabled)
        .bind(&shared_email)
        .bind(&shared_password)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ToolRecord::from(row))
    }

    async fn update_tool(&self, params: UpdateToolParams) -> Result<ToolRecord, RepoError> {
        let (shared_enabled, shared_email, shared_password) = params.shared_access.into_columns();

        let row = sqlx::query_as::<_, ToolRow>(&format!(
            "UPDATE tools t SET \
                slug = $2, name = $3, short_description = $4, full_description = $5, \
                category_id = $6, website_url = $7, cover_image = $8, logo_image = $9, \
                featured = $10, status = $11, \
                shared_enabled = $12, shared_email = $13, shared_password = $14 \
             WHERE t.id = $1 \
             RETURNING {TOOL_COLUMNS}"
        ))
        .bind(params.id)
        .bind(&params.slug)
        .bind(&params.name)
        .bind(&params.short_description)
        .bind(&params.full_description)
        .bind(params.category_id)
        .bind(&params.website_url)
        .bind(&params.cover_image)
        .bind(&params.logo_image)
        .bind(params.featured)
        .bind(params.status)
        .bind(shared_enabled)
        .bind(&shared_email)
        .bind(&shared_password)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ToolRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_tool(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tools WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
