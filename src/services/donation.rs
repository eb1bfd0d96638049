//! Donation intake and statistics

use std::sync::Arc;

use serde::Serialize;

use super::content::{ContentService, StatusCounts};
use super::error::{ServiceError, ServiceResult};
use crate::db::repositories::{CampaignTotal, DonationStatsRepository};
use crate::models::{Campaign, CampaignStatus, Donation, DonationInput, DonationStatus};

/// Figures shown on the donations dashboard
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DonationStatistics {
    pub total_count: i64,
    pub by_status: Vec<(String, i64)>,
    pub completed_count: i64,
    pub completed_amount_cents: i64,
    /// Mean completed donation, rounded to the nearest cent; 0 when none
    pub average_amount_cents: i64,
    pub donor_count: i64,
    pub by_campaign: Vec<CampaignTotal>,
}

#[derive(Clone)]
pub struct DonationService {
    donations: ContentService<Donation>,
    campaigns: ContentService<Campaign>,
    stats: Arc<dyn DonationStatsRepository>,
}

impl DonationService {
    pub fn new(
        donations: ContentService<Donation>,
        campaigns: ContentService<Campaign>,
        stats: Arc<dyn DonationStatsRepository>,
    ) -> Self {
        Self {
            donations,
            campaigns,
            stats,
        }
    }

    /// Record a donation submitted from the public site.
    ///
    /// The stored status is always `pending`; payment confirmation happens
    /// elsewhere and is applied through the admin update.
    pub async fn intake(&self, mut input: DonationInput) -> ServiceResult<Donation> {
        input.status = DonationStatus::Pending;

        if let Some(campaign_id) = input.campaign_id {
            let campaign = match self.campaigns.get(campaign_id).await {
                Ok(campaign) => campaign,
                Err(ServiceError::NotFound(_)) => {
                    return Err(ServiceError::validation(format!(
                        "Campaign {} does not exist",
                        campaign_id
                    )))
                }
                Err(e) => return Err(e),
            };
            if campaign.status != CampaignStatus::Active {
                return Err(ServiceError::validation(format!(
                    "Campaign '{}' is not accepting donations",
                    campaign.slug
                )));
            }
        }

        let donation = self.donations.create(input).await?;
        tracing::info!(
            "Donation {} recorded via {}",
            donation.id,
            donation.payment_method
        );
        Ok(donation)
    }

    pub async fn statistics(&self) -> ServiceResult<DonationStatistics> {
        let StatusCounts { total, by_status } = self.donations.count_by_status().await?;
        let totals = self.stats.completed_totals().await?;
        let by_campaign = self.stats.completed_by_campaign().await?;

        Ok(DonationStatistics {
            total_count: total,
            by_status,
            completed_count: totals.donation_count,
            completed_amount_cents: totals.amount_cents,
            average_amount_cents: average(totals.amount_cents, totals.donation_count),
            donor_count: totals.donor_count,
            by_campaign,
        })
    }
}

fn average(sum: i64, count: i64) -> i64 {
    if count <= 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxDonationStatsRepository, SqlxRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{CampaignInput, PaymentMethod};

    async fn setup() -> (DynDatabasePool, DonationService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = DonationService::new(
            ContentService::new(SqlxRepository::<Donation>::boxed(pool.clone())),
            ContentService::new(SqlxRepository::<Campaign>::boxed(pool.clone())),
            SqlxDonationStatsRepository::boxed(pool.clone()),
        );
        (pool, service)
    }

    async fn campaign(service: &DonationService, title: &str, status: CampaignStatus) -> Campaign {
        let input = CampaignInput {
            title: title.to_string(),
            goal_cents: 100_000,
            currency: "USD".to_string(),
            status,
            ..Default::default()
        };
        service.campaigns.create(input).await.unwrap()
    }

    fn donation(email: &str, cents: i64, campaign_id: Option<i64>) -> DonationInput {
        DonationInput {
            donor_name: "Ada".to_string(),
            donor_email: email.to_string(),
            amount_cents: cents,
            currency: "USD".to_string(),
            campaign_id,
            payment_method: PaymentMethod::Stripe,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_intake_forces_pending() {
        let (_pool, service) = setup().await;
        let mut input = donation("ada@example.org", 2500, None);
        input.status = DonationStatus::Completed;

        let stored = service.intake(input).await.unwrap();
        assert_eq!(stored.status, DonationStatus::Pending);
        assert_eq!(stored.amount_cents, 2500);
    }

    #[tokio::test]
    async fn test_intake_requires_active_campaign() {
        let (_pool, service) = setup().await;
        let draft = campaign(&service, "Draft drive", CampaignStatus::Draft).await;
        let active = campaign(&service, "Wells", CampaignStatus::Active).await;

        let result = service.intake(donation("a@example.org", 100, Some(draft.id))).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let result = service.intake(donation("a@example.org", 100, Some(999))).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));

        let stored = service
            .intake(donation("a@example.org", 100, Some(active.id)))
            .await
            .unwrap();
        assert_eq!(stored.campaign_id, Some(active.id));
    }

    #[tokio::test]
    async fn test_intake_rejects_invalid_amount() {
        let (_pool, service) = setup().await;
        let result = service.intake(donation("a@example.org", 0, None)).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_statistics_without_donations() {
        let (_pool, service) = setup().await;
        let stats = service.statistics().await.unwrap();
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.completed_amount_cents, 0);
        assert_eq!(stats.average_amount_cents, 0);
        assert_eq!(stats.by_status.len(), DonationStatus::ALL.len());
        assert!(stats.by_campaign.is_empty());
    }

    #[tokio::test]
    async fn test_statistics() {
        let (_pool, service) = setup().await;
        let wells = campaign(&service, "Wells", CampaignStatus::Active).await;

        for (email, cents, status) in [
            ("a@example.org", 1000, DonationStatus::Completed),
            ("a@example.org", 2001, DonationStatus::Completed),
            ("b@example.org", 5000, DonationStatus::Pending),
            ("c@example.org", 700, DonationStatus::Refunded),
        ] {
            let mut input = donation(email, cents, Some(wells.id));
            input.status = status;
            service.donations.create(input).await.unwrap();
        }

        let stats = service.statistics().await.unwrap();
        assert_eq!(stats.total_count, 4);
        assert_eq!(stats.completed_count, 2);
        assert_eq!(stats.completed_amount_cents, 3001);
        assert_eq!(stats.average_amount_cents, 1501);
        assert_eq!(stats.donor_count, 1);
        assert!(stats.by_status.contains(&("pending".to_string(), 1)));
        assert!(stats.by_status.contains(&("failed".to_string(), 0)));
        assert_eq!(stats.by_campaign.len(), 1);
        assert_eq!(stats.by_campaign[0].campaign_id, wells.id);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(0, 0), 0);
        assert_eq!(average(10, 3), 3);
        assert_eq!(average(3001, 2), 1501);
    }
}
