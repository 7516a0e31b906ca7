//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Duration;

use folio_core::{
    AboutPage, CareerJourney, HeroPage, Project, ProjectPage, TechnicalSkill, TestimonyPage,
};
use folio_storage::{CacheStore, InMemoryCacheStore, RedisCacheStore, RedisConfig};

use crate::auth::AuthConfig;
use crate::config::{ApiConfig, CacheBackend};
use crate::db::DbClient;
use crate::middleware::{CacheBinding, ClientRateLimiter};
use crate::repositories::{
    InMemoryItemRepository, InMemoryPageRepository, ItemRepository, PageRepository,
    PgRepository, TestimonyRepository,
};
use crate::services::{ImageService, ItemService, PageService, TestimonySummarizer, TestimonyService};

// ============================================================================
// REPOSITORIES
// ============================================================================

/// One repository per resource family.
#[derive(Clone)]
pub struct Repositories {
    pub hero: Arc<dyn PageRepository<HeroPage>>,
    pub about: Arc<dyn PageRepository<AboutPage>>,
    pub skills: Arc<dyn ItemRepository<TechnicalSkill>>,
    pub careers: Arc<dyn ItemRepository<CareerJourney>>,
    pub testimony_page: Arc<dyn PageRepository<TestimonyPage>>,
    pub testimonies: Arc<dyn TestimonyRepository>,
    pub project_page: Arc<dyn PageRepository<ProjectPage>>,
    pub projects: Arc<dyn ItemRepository<Project>>,
}

impl Repositories {
    /// Every family backed by the same Postgres pool.
    pub fn postgres(db: DbClient) -> Self {
        let pg = Arc::new(PgRepository::new(db));
        Self {
            hero: pg.clone(),
            about: pg.clone(),
            skills: pg.clone(),
            careers: pg.clone(),
            testimony_page: pg.clone(),
            testimonies: pg.clone(),
            project_page: pg.clone(),
            projects: pg,
        }
    }

    /// Empty process-local stores.
    pub fn in_memory() -> Self {
        Self {
            hero: Arc::new(InMemoryPageRepository::new()),
            about: Arc::new(InMemoryPageRepository::new()),
            skills: Arc::new(InMemoryItemRepository::new()),
            careers: Arc::new(InMemoryItemRepository::new()),
            testimony_page: Arc::new(InMemoryPageRepository::new()),
            testimonies: Arc::new(InMemoryItemRepository::new()),
            project_page: Arc::new(InMemoryPageRepository::new()),
            projects: Arc::new(InMemoryItemRepository::new()),
        }
    }
}

// ============================================================================
// CACHE STORE
// ============================================================================

/// Open the configured cache backend.
///
/// An unreachable Redis degrades to a process-local cache; startup never
/// fails on the cache.
pub async fn build_cache_store(backend: CacheBackend, redis: &RedisConfig) -> Arc<dyn CacheStore> {
    match backend {
        CacheBackend::Redis => match RedisCacheStore::connect(redis).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    host = %redis.host,
                    port = redis.port,
                    "Redis unavailable, falling back to in-process cache"
                );
                Arc::new(InMemoryCacheStore::new())
            }
        },
        CacheBackend::Memory => Arc::new(InMemoryCacheStore::new()),
    }
}

// ============================================================================
// RATE LIMITERS
// ============================================================================

/// The three limiter instances. Each keeps its own per-client buckets.
#[derive(Debug, Clone)]
pub struct Limiters {
    pub global: Arc<ClientRateLimiter>,
    pub public: Arc<ClientRateLimiter>,
    pub auth: Arc<ClientRateLimiter>,
}

impl Limiters {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            global: Arc::new(ClientRateLimiter::new("global", config.rate_limit_global)),
            public: Arc::new(ClientRateLimiter::new("public", config.rate_limit_public)),
            auth: Arc::new(ClientRateLimiter::new("auth", config.rate_limit_auth)),
        }
    }

    /// All instances, for the idle bucket sweep.
    pub fn all(&self) -> Vec<Arc<ClientRateLimiter>> {
        vec![self.global.clone(), self.public.clone(), self.auth.clone()]
    }
}

// ============================================================================
// APPLICATION STATE
// ============================================================================

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub api_config: ApiConfig,
    pub auth_config: Arc<AuthConfig>,
    /// Response cache shared by every family.
    pub cache: Arc<dyn CacheStore>,
    pub hero: PageService<HeroPage>,
    pub about: PageService<AboutPage>,
    pub skills: ItemService<TechnicalSkill>,
    pub careers: ItemService<CareerJourney>,
    pub testimony_page: PageService<TestimonyPage>,
    pub testimonies: TestimonyService,
    pub project_page: PageService<ProjectPage>,
    pub projects: ItemService<Project>,
    pub images: ImageService,
    pub limiters: Limiters,
}

impl AppState {
    pub fn new(
        api_config: ApiConfig,
        auth_config: AuthConfig,
        cache: Arc<dyn CacheStore>,
        repos: Repositories,
        summarizer: Option<Arc<dyn TestimonySummarizer>>,
        images: ImageService,
    ) -> Self {
        let limiters = Limiters::from_config(&api_config);
        Self {
            auth_config: Arc::new(auth_config),
            cache,
            hero: PageService::new(repos.hero),
            about: PageService::new(repos.about),
            skills: ItemService::new(repos.skills),
            careers: ItemService::new(repos.careers),
            testimony_page: PageService::new(repos.testimony_page),
            testimonies: TestimonyService::new(repos.testimonies, summarizer),
            project_page: PageService::new(repos.project_page),
            projects: ItemService::new(repos.projects),
            images,
            limiters,
            api_config,
        }
    }

    /// Bind the shared cache to one family key with the configured TTL.
    pub fn cache_binding(&self, key: &'static str) -> CacheBinding {
        CacheBinding::new(self.cache.clone(), key, self.cache_ttl())
    }

    pub fn cache_ttl(&self) -> Duration {
        self.api_config.cache_ttl
    }
}

crate::impl_from_ref!(Arc<AuthConfig>, auth_config);
crate::impl_from_ref!(PageService<HeroPage>, hero);
crate::impl_from_ref!(PageService<AboutPage>, about);
crate::impl_from_ref!(ItemService<TechnicalSkill>, skills);
crate::impl_from_ref!(ItemService<CareerJourney>, careers);
crate::impl_from_ref!(PageService<TestimonyPage>, testimony_page);
crate::impl_from_ref!(TestimonyService, testimonies);
crate::impl_from_ref!(PageService<ProjectPage>, project_page);
crate::impl_from_ref!(ItemService<Project>, projects);
crate::impl_from_ref!(ImageService, images);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_backend() {
        let store = build_cache_store(CacheBackend::Memory, &RedisConfig::default()).await;
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_memory() {
        let redis = RedisConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            connect_timeout: Duration::from_millis(200),
            ..RedisConfig::default()
        };
        let store = build_cache_store(CacheBackend::Redis, &redis).await;
        assert_eq!(store.backend_name(), "memory");
        assert!(store.ping().await.is_ok());
    }
}
