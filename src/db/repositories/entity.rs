//! Generic entity repository
//!
//! `EntityRepository<E>` is the persistence side of every listing and every
//! admin edit. `SqlxRepository<E>` implements it for SQLite and MySQL from
//! the table description carried by `E`.

use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};

use super::row::{bind_mysql, bind_sqlite};
use super::statement::{self, Statement};
use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::{Entity, ListFilter, PageRequest, Reference};

#[async_trait]
pub trait EntityRepository<E: Entity>: Send + Sync {
    /// Number of records matching every criterion of `filter`
    async fn count_matching(&self, filter: &ListFilter) -> Result<i64>;

    /// One window of matching records, newest first
    async fn find_page(&self, filter: &ListFilter, page: PageRequest) -> Result<Vec<E>>;

    async fn find_by_id(&self, id: i64) -> Result<Option<E>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>>;

    /// Whether another record (not `exclude_id`) already uses `slug`
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;

    async fn insert(&self, input: &E::Input) -> Result<E>;

    /// Replace every writable column; `None` when no record has `id`
    async fn update(&self, id: i64, input: &E::Input) -> Result<Option<E>>;

    /// Returns false when no record had `id`
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn reference_exists(&self, reference: &Reference) -> Result<bool>;
}

/// SQLx-backed repository for any `Entity`
pub struct SqlxRepository<E> {
    pool: DynDatabasePool,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqlxRepository<E> {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn EntityRepository<E>> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<E>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => fetch_all_sqlite(sqlite_pool(&self.pool)?, stmt).await,
            DatabaseDriver::Mysql => fetch_all_mysql(mysql_pool(&self.pool)?, stmt).await,
        }
    }

    async fn fetch_optional(&self, stmt: &Statement) -> Result<Option<E>> {
        Ok(self.fetch_all(stmt).await?.into_iter().next())
    }

    async fn fetch_count(&self, stmt: &Statement) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_sqlite(sqlite_pool(&self.pool)?, stmt).await,
            DatabaseDriver::Mysql => count_mysql(mysql_pool(&self.pool)?, stmt).await,
        }
    }

    /// Run a write, returning (rows affected, last insert id)
    async fn execute(&self, stmt: &Statement) -> Result<(u64, i64)> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => execute_sqlite(sqlite_pool(&self.pool)?, stmt).await,
            DatabaseDriver::Mysql => execute_mysql(mysql_pool(&self.pool)?, stmt).await,
        }
    }
}

#[async_trait]
impl<E: Entity> EntityRepository<E> for SqlxRepository<E> {
    async fn count_matching(&self, filter: &ListFilter) -> Result<i64> {
        let stmt = statement::count::<E>(filter)?;
        self.fetch_count(&stmt)
            .await
            .with_context(|| format!("Failed to count {}", E::TABLE))
    }

    async fn find_page(&self, filter: &ListFilter, page: PageRequest) -> Result<Vec<E>> {
        let stmt = statement::page::<E>(filter, page)?;
        self.fetch_all(&stmt)
            .await
            .with_context(|| format!("Failed to list {}", E::TABLE))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<E>> {
        self.fetch_optional(&statement::by_id::<E>(id))
            .await
            .with_context(|| format!("Failed to get {} by ID", E::LABEL))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>> {
        if !E::HAS_SLUG {
            anyhow::bail!("{} records have no slug", E::LABEL);
        }
        self.fetch_optional(&statement::by_slug::<E>(slug))
            .await
            .with_context(|| format!("Failed to get {} by slug", E::LABEL))
    }

    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        if !E::HAS_SLUG {
            return Ok(false);
        }
        let count = self
            .fetch_count(&statement::slug_count::<E>(slug, exclude_id))
            .await
            .context("Failed to check slug existence")?;
        Ok(count > 0)
    }

    async fn insert(&self, input: &E::Input) -> Result<E> {
        let (_, id) = self
            .execute(&statement::insert::<E>(input, Utc::now()))
            .await
            .with_context(|| format!("Failed to create {}", E::LABEL))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("{} {} not found after insert", E::LABEL, id))
    }

    async fn update(&self, id: i64, input: &E::Input) -> Result<Option<E>> {
        self.execute(&statement::update::<E>(id, input, Utc::now()))
            .await
            .with_context(|| format!("Failed to update {}", E::LABEL))?;

        // MySQL reports zero affected rows for no-op updates, so re-read
        // instead of trusting the count.
        self.find_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let (affected, _) = self
            .execute(&statement::delete::<E>(id))
            .await
            .with_context(|| format!("Failed to delete {}", E::LABEL))?;
        Ok(affected > 0)
    }

    async fn reference_exists(&self, reference: &Reference) -> Result<bool> {
        let count = self
            .fetch_count(&statement::reference_count(reference))
            .await
            .with_context(|| format!("Failed to look up {} {}", reference.label, reference.id))?;
        Ok(count > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn fetch_all_sqlite<E: Entity>(pool: &SqlitePool, stmt: &Statement) -> Result<Vec<E>> {
    let mut query = sqlx::query(&stmt.sql);
    for arg in &stmt.args {
        query = bind_sqlite(query, arg);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(|row| E::from_row(row)).collect()
}

async fn count_sqlite(pool: &SqlitePool, stmt: &Statement) -> Result<i64> {
    let mut query = sqlx::query(&stmt.sql);
    for arg in &stmt.args {
        query = bind_sqlite(query, arg);
    }

    let row = query.fetch_one(pool).await?;
    Ok(row.try_get(0)?)
}

async fn execute_sqlite(pool: &SqlitePool, stmt: &Statement) -> Result<(u64, i64)> {
    let mut query = sqlx::query(&stmt.sql);
    for arg in &stmt.args {
        query = bind_sqlite(query, arg);
    }

    let result = query.execute(pool).await?;
    Ok((result.rows_affected(), result.last_insert_rowid()))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn fetch_all_mysql<E: Entity>(pool: &MySqlPool, stmt: &Statement) -> Result<Vec<E>> {
    let mut query = sqlx::query(&stmt.sql);
    for arg in &stmt.args {
        query = bind_mysql(query, arg);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(|row| E::from_row(row)).collect()
}

async fn count_mysql(pool: &MySqlPool, stmt: &Statement) -> Result<i64> {
    let mut query = sqlx::query(&stmt.sql);
    for arg in &stmt.args {
        query = bind_mysql(query, arg);
    }

    let row = query.fetch_one(pool).await?;
    Ok(row.try_get(0)?)
}

async fn execute_mysql(pool: &MySqlPool, stmt: &Statement) -> Result<(u64, i64)> {
    let mut query = sqlx::query(&stmt.sql);
    for arg in &stmt.args {
        query = bind_mysql(query, arg);
    }

    let result = query.execute(pool).await?;
    Ok((result.rows_affected(), result.last_insert_id() as i64))
}
