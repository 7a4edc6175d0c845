//! Cache key definitions.
//!
//! Defines `EntityKey` for domain entities and derived collections, plus the
//! hash helper used to key memoized list results by request shape.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use crate::application::repos::{ToolListScope, ToolQueryFilter};

/// Identifies a domain entity or derived collection for cache invalidation.
///
/// When an entity changes, every cache entry that depends on it must be
/// dropped before the mutation reports success.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// The full category listing.
    Categories,
    /// A tool identified by its database ID.
    Tool(Uuid),
    /// A tool identified by its URL slug.
    ToolSlug(String),
    /// Every cached tool, id- and slug-keyed alike. Used when a change
    /// cannot be attributed to specific tools, e.g. a category delete
    /// nulling out references.
    ToolsAll,
    /// Every memoized tool list, regardless of filter shape.
    ToolLists,
    /// The rating aggregate of one tool.
    Aggregate(Uuid),
    /// One user's cached rating of one tool.
    UserRating { tool_id: Uuid, user_id: Uuid },
    /// Every cached per-user rating. Used when a tool disappears and the
    /// affected (tool, user) pairs cannot be enumerated.
    UserRatingsAll,
}

/// Hash a list request shape (scope plus filter) for the list cache key.
///
/// Two requests with the same scope, category, and search text map to the
/// same slot; anything else is a distinct memoization.
pub fn hash_list_request(scope: ToolListScope, filter: &ToolQueryFilter) -> u64 {
    let mut hasher = DefaultHasher::new();
    scope.hash(&mut hasher);
    filter.category.hash(&mut hasher);
    filter.search.hash(&mut hasher);
    hasher.finish()
}
