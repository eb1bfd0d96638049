//! Aggregate queries over completed donations

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{MySqlPool, Row, SqlitePool};

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};

/// Sums over every completed donation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompletedTotals {
    pub donation_count: i64,
    pub amount_cents: i64,
    pub donor_count: i64,
}

/// Completed donations attributed to one campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampaignTotal {
    pub campaign_id: i64,
    pub donation_count: i64,
    pub amount_cents: i64,
}

#[async_trait]
pub trait DonationStatsRepository: Send + Sync {
    async fn completed_totals(&self) -> Result<CompletedTotals>;

    /// Per-campaign totals, largest first
    async fn completed_by_campaign(&self) -> Result<Vec<CampaignTotal>>;
}

pub struct SqlxDonationStatsRepository {
    pool: DynDatabasePool,
}

impl SqlxDonationStatsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn DonationStatsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl DonationStatsRepository for SqlxDonationStatsRepository {
    async fn completed_totals(&self) -> Result<CompletedTotals> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => completed_totals_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => completed_totals_mysql(mysql_pool(&self.pool)?).await,
        }
    }

    async fn completed_by_campaign(&self) -> Result<Vec<CampaignTotal>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => completed_by_campaign_sqlite(sqlite_pool(&self.pool)?).await,
            DatabaseDriver::Mysql => completed_by_campaign_mysql(mysql_pool(&self.pool)?).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn completed_totals_sqlite(pool: &SqlitePool) -> Result<CompletedTotals> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS donation_count,
               COALESCE(SUM(amount_cents), 0) AS amount_cents,
               COUNT(DISTINCT donor_email) AS donor_count
        FROM donations
        WHERE status = 'completed'
        "#,
    )
    .fetch_one(pool)
    .await
    .context("Failed to total completed donations")?;

    Ok(CompletedTotals {
        donation_count: row.try_get("donation_count")?,
        amount_cents: row.try_get("amount_cents")?,
        donor_count: row.try_get("donor_count")?,
    })
}

async fn completed_by_campaign_sqlite(pool: &SqlitePool) -> Result<Vec<CampaignTotal>> {
    let rows = sqlx::query(
        r#"
        SELECT campaign_id,
               COUNT(*) AS donation_count,
               COALESCE(SUM(amount_cents), 0) AS amount_cents
        FROM donations
        WHERE status = 'completed' AND campaign_id IS NOT NULL
        GROUP BY campaign_id
        ORDER BY amount_cents DESC, campaign_id ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to total donations by campaign")?;

    rows.iter()
        .map(|row| {
            Ok(CampaignTotal {
                campaign_id: row.try_get("campaign_id")?,
                donation_count: row.try_get("donation_count")?,
                amount_cents: row.try_get("amount_cents")?,
            })
        })
        .collect()
}

// ============================================================================
// MySQL implementations
// ============================================================================

// SUM over BIGINT yields DECIMAL in MySQL; cast back to a signed integer.

async fn completed_totals_mysql(pool: &MySqlPool) -> Result<CompletedTotals> {
    let row = sqlx::query(
        r#"
        SELECT COUNT(*) AS donation_count,
               CAST(COALESCE(SUM(amount_cents), 0) AS SIGNED) AS amount_cents,
               COUNT(DISTINCT donor_email) AS donor_count
        FROM donations
        WHERE status = 'completed'
        "#,
    )
    .fetch_one(pool)
    .await
    .context("Failed to total completed donations")?;

    Ok(CompletedTotals {
        donation_count: row.try_get("donation_count")?,
        amount_cents: row.try_get("amount_cents")?,
        donor_count: row.try_get("donor_count")?,
    })
}

async fn completed_by_campaign_mysql(pool: &MySqlPool) -> Result<Vec<CampaignTotal>> {
    let rows = sqlx::query(
        r#"
        SELECT campaign_id,
               COUNT(*) AS donation_count,
               CAST(COALESCE(SUM(amount_cents), 0) AS SIGNED) AS amount_cents
        FROM donations
        WHERE status = 'completed' AND campaign_id IS NOT NULL
        GROUP BY campaign_id
        ORDER BY amount_cents DESC, campaign_id ASC
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to total donations by campaign")?;

    rows.iter()
        .map(|row| {
            Ok(CampaignTotal {
                campaign_id: row.try_get("campaign_id")?,
                donation_count: row.try_get("donation_count")?,
                amount_cents: row.try_get("amount_cents")?,
            })
        })
        .collect()
}
