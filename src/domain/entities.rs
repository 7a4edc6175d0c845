//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{SharedAccess, ToolStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolRecord {
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
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub icon: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Abbreviated category shape embedded in catalog read models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<CategoryRecord> for CategoryRef {
    fn from(record: CategoryRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            slug: record.slug,
        }
    }
}

/// One user's rating of one tool. At most one row per (tool, user).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRecord {
    pub id: Uuid,
    pub tool_id: Uuid,
    pub user_id: Uuid,
    pub value: i16,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Derived (average, count) over all ratings of one tool. Never stored;
/// recomputed or cache-invalidated whenever a rating for the tool changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: u64,
}

impl RatingAggregate {
    pub const EMPTY: RatingAggregate = RatingAggregate {
        average: 0.0,
        count: 0,
    };

    /// Average rounded to one decimal for display. Internal consumers keep
    /// the full-precision `average` field.
    pub fn display_average(&self) -> f64 {
        (self.average * 10.0).round() / 10.0
    }
}

/// A tool row joined with its category, as the list/detail queries return it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolListing {
    pub tool: ToolRecord,
    pub category: Option<CategoryRef>,
}

/// The catalog read model: a listed tool enriched with its rating aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub tool: ToolRecord,
    pub category: Option<CategoryRef>,
    pub rating: RatingAggregate,
}

impl CatalogEntry {
    pub fn from_listing(listing: ToolListing, rating: RatingAggregate) -> Self {
        Self {
            tool: listing.tool,
            category: listing.category,
            rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogRecord {
    pub id: Uuid,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub payload_text: Option<String>,
    pub created_at: OffsetDateTime,
}
