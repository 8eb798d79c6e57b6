//! Session state service (visit counting)

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppResult, models::session::SessionContext};

use super::redis::RedisService;

/// Where session contexts live between requests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Count a visit atomically and return the session including it.
    ///
    /// Unknown sessions start from zero.
    async fn record_visit(&self, session_id: Uuid) -> AppResult<SessionContext>;
}

/// Sessions kept in Redis, expiring after a period of inactivity
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: RedisService,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(redis: RedisService, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

fn visits_key(session_id: Uuid) -> String {
    format!("session:{}:num_visits", session_id)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn record_visit(&self, session_id: Uuid) -> AppResult<SessionContext> {
        let visits = self
            .redis
            .increment_counter(&visits_key(session_id), self.ttl_seconds)
            .await?;
        Ok(SessionContext::new(session_id, visits))
    }
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Record a visit and return how many visits the session had before it
    pub async fn visit(&self, session_id: Uuid) -> AppResult<i64> {
        let session = self.store.record_visit(session_id).await?;

        tracing::debug!(%session_id, visits = session.num_visits(), "session visit recorded");
        Ok(session.previous_visits())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visits_key() {
        let id = Uuid::nil();
        assert_eq!(
            visits_key(id),
            "session:00000000-0000-0000-0000-000000000000:num_visits"
        );
    }

    #[tokio::test]
    async fn test_visit_returns_previous_count() {
        let session_id = Uuid::new_v4();

        let mut store = MockSessionStore::new();
        store
            .expect_record_visit()
            .withf(move |id| *id == session_id)
            .times(1)
            .returning(|id| Ok(SessionContext::new(id, 5)));

        let service = SessionService::new(Arc::new(store));
        assert_eq!(service.visit(session_id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_first_visit() {
        let mut store = MockSessionStore::new();
        store
            .expect_record_visit()
            .returning(|id| Ok(SessionContext::new(id, 1)));

        let service = SessionService::new(Arc::new(store));
        assert_eq!(service.visit(Uuid::new_v4()).await.unwrap(), 0);
    }

    /// Every visit goes through the store's single increment, so two
    /// concurrent requests each see a distinct count
    #[tokio::test]
    async fn test_concurrent_visits_each_counted() {
        use std::sync::atomic::{AtomicI64, Ordering};

        let counter = Arc::new(AtomicI64::new(0));
        let mut store = MockSessionStore::new();
        let shared = counter.clone();
        store
            .expect_record_visit()
            .times(2)
            .returning(move |id| Ok(SessionContext::new(id, shared.fetch_add(1, Ordering::SeqCst) + 1)));

        let service = SessionService::new(Arc::new(store));
        let session_id = Uuid::new_v4();
        let (first, second) = tokio::join!(service.visit(session_id), service.visit(session_id));

        let mut seen = vec![first.unwrap(), second.unwrap()];
        seen.sort();
        assert_eq!(seen, vec![0, 1]);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
