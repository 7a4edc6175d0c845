//! Postgres-backed repository implementations.

mod audit;
mod categories;
mod ratings;
mod tools;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, QueryBuilder, Transaction,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{ToolListScope, ToolQueryFilter};
use crate::domain::types::ToolStatus;

/// Featured entries first, then newest, with the id as a stable tie-break.
const TOOLS_LISTING_ORDER: &str = " ORDER BY t.featured DESC, t.created_at DESC, t.id DESC";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    fn apply_scope_conditions(qb: &mut QueryBuilder<'_, Postgres>, scope: ToolListScope) {
        if scope == ToolListScope::Public {
            qb.push(" AND t.status = ");
            qb.push_bind(ToolStatus::Published);
        }
    }

    fn apply_catalog_filter<'q>(qb: &mut QueryBuilder<'q, Postgres>, filter: &'q ToolQueryFilter) {
        if let Some(category) = filter.category.as_ref() {
            qb.push(" AND t.category_id = ");
            qb.push_bind(category);
        }

        if let Some(search) = filter.search.as_ref() {
            qb.push(" AND (");
            qb.push("t.name ILIKE ");
            qb.push_bind(format!("%{}%", search));
            qb.push(" OR t.short_description ILIKE ");
            qb.push_bind(format!("%{}%", search));
            qb.push(")");
        }
    }
}
