//! Data-access and aggregation core for a curated tools directory.
//!
//! The crate is layered: [`domain`] holds the entity types and slug rules,
//! [`application`] the catalog queries, rating submission, and admin
//! mutations behind repository traits, [`cache`] the event-driven
//! invalidation layer, and [`infra`] the Postgres adapters and telemetry
//! wiring. [`Directory`] assembles the layers into ready-to-use services.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

use std::sync::Arc;

pub use application::identity::{Identity, IdentityProvider};

use application::admin::audit::AdminAuditService;
use application::admin::categories::AdminCategoryService;
use application::admin::tools::AdminToolService;
use application::catalog::CatalogService;
use application::ratings::RatingService;
use application::repos::{
    AuditRepo, CategoriesRepo, CategoriesWriteRepo, RatingsRepo, ToolsRepo, ToolsWriteRepo,
};
use cache::{CacheConfig, CacheConsumer, CacheTrigger, CatalogStore, EventQueue};
use infra::db::PostgresRepositories;

/// Repository handles needed to assemble a [`Directory`].
///
/// Production code passes the same [`PostgresRepositories`] for every slot;
/// tests substitute in-memory fakes per trait.
pub struct Repositories {
    pub tools: Arc<dyn ToolsRepo>,
    pub tools_write: Arc<dyn ToolsWriteRepo>,
    pub categories: Arc<dyn CategoriesRepo>,
    pub categories_write: Arc<dyn CategoriesWriteRepo>,
    pub ratings: Arc<dyn RatingsRepo>,
    pub audit: Arc<dyn AuditRepo>,
}

impl Repositories {
    pub fn postgres(repos: PostgresRepositories) -> Self {
        let shared = Arc::new(repos);
        Self {
            tools: shared.clone(),
            tools_write: shared.clone(),
            categories: shared.clone(),
            categories_write: shared.clone(),
            ratings: shared.clone(),
            audit: shared,
        }
    }
}

/// Assembled directory services sharing one cache and one event queue.
pub struct Directory {
    pub catalog: CatalogService,
    pub ratings: RatingService,
    pub admin_tools: AdminToolService,
    pub admin_categories: AdminCategoryService,
    pub audit: AdminAuditService,
    pub store: Arc<CatalogStore>,
    pub consumer: Arc<CacheConsumer>,
    pub trigger: Arc<CacheTrigger>,
}

impl Directory {
    pub fn new(repos: Repositories, cache_config: CacheConfig) -> Self {
        let store = Arc::new(CatalogStore::new(&cache_config));
        let queue = Arc::new(EventQueue::new());
        let consumer = Arc::new(CacheConsumer::new(
            cache_config.clone(),
            store.clone(),
            queue.clone(),
        ));
        let trigger = Arc::new(CacheTrigger::new(
            cache_config.clone(),
            queue,
            consumer.clone(),
        ));

        let audit = AdminAuditService::new(repos.audit);

        let catalog = CatalogService::new(
            repos.tools.clone(),
            repos.categories.clone(),
            repos.ratings.clone(),
            store.clone(),
            &cache_config,
        );
        let ratings = RatingService::new(
            repos.tools.clone(),
            repos.ratings,
            store.clone(),
            trigger.clone(),
            &cache_config,
        );
        let admin_tools = AdminToolService::new(
            repos.tools,
            repos.categories.clone(),
            repos.tools_write,
            audit.clone(),
            trigger.clone(),
        );
        let admin_categories = AdminCategoryService::new(
            repos.categories,
            repos.categories_write,
            audit.clone(),
            trigger.clone(),
        );

        Self {
            catalog,
            ratings,
            admin_tools,
            admin_categories,
            audit,
            store,
            consumer,
            trigger,
        }
    }

    /// Assemble against Postgres using resolved settings.
    pub fn from_settings(settings: &config::Settings, repos: PostgresRepositories) -> Self {
        Self::new(
            Repositories::postgres(repos),
            CacheConfig::from(&settings.cache),
        )
    }
}
