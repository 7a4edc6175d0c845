use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RatingsRepo, RepoError};
use crate::domain::entities::{RatingAggregate, RatingRecord};

use super::{PostgresRepositories, map_sqlx_error};

const RATING_COLUMNS: &str = "id, tool_id, user_id, value, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RatingRow {
    id: Uuid,
    tool_id: Uuid,
    user_id: Uuid,
    value: i16,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<RatingRow> for RatingRecord {
    fn from(row: RatingRow) -> Self {
        Self {
            id: row.id,
            tool_id: row.tool_id,
            user_id: row.user_id,
            value: row.value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AggregateRow {
    tool_id: Uuid,
    average: Option<f64>,
    count: i64,
}

impl From<AggregateRow> for RatingAggregate {
    fn from(row: AggregateRow) -> Self {
        Self {
            average: row.average.unwrap_or(0.0),
            count: row.count.max(0) as u64,
        }
    }
}

#[async_trait]
impl RatingsRepo for PostgresRepositories {
    async fn upsert_rating(
        &self,
        tool_id: Uuid,
        user_id: Uuid,
        value: i16,
    ) -> Result<RatingRecord, RepoError> {
        // ON CONFLICT makes the replace atomic per (tool, user); concurrent
        // submissions settle on one row without surfacing a unique violation.
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "INSERT INTO ratings (id, tool_id, user_id, value) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (tool_id, user_id) \
             DO UPDATE SET value = EXCLUDED.value, updated_at = now() \
             RETURNING {RATING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(tool_id)
        .bind(user_id)
        .bind(value)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(RatingRecord::from(row))
    }

    async fn find_user_rating(
        &self,
        tool_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<RatingRecord>, RepoError> {
        let row = sqlx::query_as::<_, RatingRow>(&format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE tool_id = $1 AND user_id = $2"
        ))
        .bind(tool_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(RatingRecord::from))
    }

    async fn aggregate_for(&self, tool_id: Uuid) -> Result<RatingAggregate, RepoError> {
        let row = sqlx::query_as::<_, AggregateRow>(
            "SELECT tool_id, AVG(value)::float8 AS average, COUNT(*) AS count \
             FROM ratings WHERE tool_id = $1 GROUP BY tool_id",
        )
        .bind(tool_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(RatingAggregate::from).unwrap_or(RatingAggregate::EMPTY))
    }

    async fn aggregate_for_many(
        &self,
        tool_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, RatingAggregate>, RepoError> {
        if tool_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, AggregateRow>(
            "SELECT tool_id, AVG(value)::float8 AS average, COUNT(*) AS count \
             FROM ratings WHERE tool_id = ANY($1) GROUP BY tool_id",
        )
        .bind(tool_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| (row.tool_id, RatingAggregate::from(row)))
            .collect())
    }
}
