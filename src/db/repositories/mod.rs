//! Database repositories
//!
//! Every content table goes through the generic `EntityRepository`; donation
//! statistics have their own aggregate queries.

pub mod donation_stats;
pub mod entity;
mod row;
pub mod statement;

pub use donation_stats::{
    CampaignTotal, CompletedTotals, DonationStatsRepository, SqlxDonationStatsRepository,
};
pub use entity::{EntityRepository, SqlxRepository};
