//! Dashboard statistics

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::content::{ContentService, StatusCounts};
use super::error::ServiceResult;
use crate::models::Entity;

/// Anything that can report per-status counts for one table
#[async_trait]
pub trait StatusCounter: Send + Sync {
    fn table(&self) -> &'static str;

    async fn count_by_status(&self) -> ServiceResult<StatusCounts>;
}

#[async_trait]
impl<E: Entity> StatusCounter for ContentService<E> {
    fn table(&self) -> &'static str {
        E::TABLE
    }

    async fn count_by_status(&self) -> ServiceResult<StatusCounts> {
        ContentService::count_by_status(self).await
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntityCounts {
    pub entity: &'static str,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Clone, Default)]
pub struct StatisticsService {
    counters: Vec<Arc<dyn StatusCounter>>,
}

impl StatisticsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, counter: Arc<dyn StatusCounter>) -> Self {
        self.counters.push(counter);
        self
    }

    /// Total and per-status counts for every registered table, in
    /// registration order
    pub async fn dashboard(&self) -> ServiceResult<Vec<EntityCounts>> {
        let mut result = Vec::with_capacity(self.counters.len());
        for counter in &self.counters {
            result.push(EntityCounts {
                entity: counter.table(),
                counts: counter.count_by_status().await?,
            });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Grant, GrantInput, GrantStatus, Resource};

    #[tokio::test]
    async fn test_dashboard() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let grants = ContentService::new(SqlxRepository::<Grant>::boxed(pool.clone()));
        let resources = ContentService::new(SqlxRepository::<Resource>::boxed(pool.clone()));

        for (title, status) in [("A", GrantStatus::Open), ("B", GrantStatus::Open), ("C", GrantStatus::Awarded)] {
            let input = GrantInput {
                title: title.to_string(),
                status,
                ..Default::default()
            };
            grants.create(input).await.unwrap();
        }

        let stats = StatisticsService::new()
            .with(Arc::new(grants))
            .with(Arc::new(resources));
        let dashboard = stats.dashboard().await.unwrap();

        assert_eq!(dashboard.len(), 2);
        assert_eq!(dashboard[0].entity, "grants");
        assert_eq!(dashboard[0].counts.total, 3);
        assert!(dashboard[0].counts.by_status.contains(&("open".to_string(), 2)));
        assert!(dashboard[0].counts.by_status.contains(&("draft".to_string(), 0)));
        assert_eq!(dashboard[1].entity, "resources");
        assert_eq!(dashboard[1].counts.total, 0);

        let json = serde_json::to_value(&dashboard[0]).unwrap();
        assert_eq!(json["entity"], "grants");
        assert_eq!(json["total"], 3);
    }
}
