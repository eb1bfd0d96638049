//! Site-wide endpoints
//!
//! - GET /api/v1/health - liveness and database ping
//! - GET /api/v1/home - latest posts, campaigns and upcoming events
//! - GET /api/v1/admin/statistics - per-entity status counts

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Campaign, DateRange, Event, ListFilter, Post};
use crate::services::EntityCounts;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub posts: Vec<Post>,
    pub campaigns: Vec<Campaign>,
    pub events: Vec<Event>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub entities: Vec<EntityCounts>,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, database) = match state.pool.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("Database ping failed: {:#}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

/// Newest published posts, active campaigns and published events that have
/// not ended yet
pub async fn home(State(state): State<AppState>) -> Result<Json<HomeResponse>, ApiError> {
    let count = state.config.listing.latest_count;
    let today = Utc::now().date_naive();

    let posts = state
        .posts
        .latest(&ListFilter::new().status("published"), count)
        .await?;
    let campaigns = state
        .campaigns
        .latest(&ListFilter::new().status("active"), count)
        .await?;
    let events = state
        .events
        .latest(
            &ListFilter::new()
                .status("published")
                .between(DateRange::from(today)),
            count,
        )
        .await?;

    Ok(Json(HomeResponse {
        posts,
        campaigns,
        events,
    }))
}

pub async fn statistics(State(state): State<AppState>) -> Result<Json<StatisticsResponse>, ApiError> {
    Ok(Json(StatisticsResponse {
        entities: state.statistics.dashboard().await?,
    }))
}
