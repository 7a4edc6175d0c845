//! Vetrina Cache System
//!
//! In-process object cache for the catalog read paths:
//!
//! - Memoized list results keyed by request shape
//! - KV lookups for tools, rating aggregates, and per-user ratings
//! - A single-slot category listing
//!
//! Writes never update cached values in place. Mutation services publish
//! events and the consumer drops the affected entries; the next read
//! repopulates them from the database.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `vetrina.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! tool_limit = 500
//! list_limit = 100
//! # ... see config.rs for all options
//! ```

mod config;
mod consumer;
mod events;
mod keys;
mod lock;
mod planner;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use consumer::CacheConsumer;
pub use events::{CacheEvent, Epoch, EventKind, EventQueue};
pub use keys::{EntityKey, hash_list_request};
pub use planner::ConsumptionPlan;
pub use store::CatalogStore;
pub use trigger::CacheTrigger;
