//! Business logic services

pub mod catalog;
pub mod loans;
pub mod redis;
pub mod sessions;
pub mod stats;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub sessions: sessions::SessionService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, redis_service: redis::RedisService, config: &AppConfig) -> Self {
        let session_store = sessions::RedisSessionStore::new(
            redis_service,
            config.redis.session_ttl_seconds,
        );

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(Arc::new(repository.book_instances.clone())),
            sessions: sessions::SessionService::new(Arc::new(session_store)),
            stats: stats::StatsService::new(repository, config.catalog.highlight_keyword.clone()),
        }
    }
}
