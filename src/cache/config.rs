//! Cache configuration.
//!
//! Controls the catalog object cache via `vetrina.toml`.

use std::num::NonZeroUsize;

use serde::Deserialize;

const DEFAULT_TOOL_LIMIT: usize = 500;
const DEFAULT_LIST_LIMIT: usize = 100;
const DEFAULT_AGGREGATE_LIMIT: usize = 500;
const DEFAULT_USER_RATING_LIMIT: usize = 1000;
const DEFAULT_CONSUME_BATCH_LIMIT: usize = 100;

/// Cache configuration from `vetrina.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the catalog object cache.
    pub enabled: bool,
    /// Maximum tools in the KV cache (each of the id and slug maps).
    pub tool_limit: usize,
    /// Maximum memoized list results, keyed by request shape.
    pub list_limit: usize,
    /// Maximum rating aggregates in the KV cache.
    pub aggregate_limit: usize,
    /// Maximum per-user rating lookups in the KV cache.
    pub user_rating_limit: usize,
    /// Maximum events per consumption batch.
    pub consume_batch_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tool_limit: DEFAULT_TOOL_LIMIT,
            list_limit: DEFAULT_LIST_LIMIT,
            aggregate_limit: DEFAULT_AGGREGATE_LIMIT,
            user_rating_limit: DEFAULT_USER_RATING_LIMIT,
            consume_batch_limit: DEFAULT_CONSUME_BATCH_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            tool_limit: settings.tool_limit,
            list_limit: settings.list_limit,
            aggregate_limit: settings.aggregate_limit,
            user_rating_limit: settings.user_rating_limit,
            consume_batch_limit: settings.consume_batch_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the tool limit as NonZeroUsize, clamping to 1 if zero.
    pub fn tool_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.tool_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the list limit as NonZeroUsize, clamping to 1 if zero.
    pub fn list_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.list_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the aggregate limit as NonZeroUsize, clamping to 1 if zero.
    pub fn aggregate_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.aggregate_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the user rating limit as NonZeroUsize, clamping to 1 if zero.
    pub fn user_rating_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.user_rating_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
