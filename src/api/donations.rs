//! Donation endpoints
//!
//! - POST /api/v1/donations - public intake, always stored as pending
//! - GET  /api/v1/admin/donations/statistics - totals for the dashboard

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

use crate::api::middleware::{ApiError, AppState, RequestContext};
use crate::models::{Donation, DonationInput};
use crate::services::DonationStatistics;

pub async fn create_donation(
    State(state): State<AppState>,
    context: RequestContext,
    payload: Result<Json<DonationInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Donation>), ApiError> {
    let Json(input) = payload?;
    let donation = state.donation_service.intake(input).await?;
    tracing::debug!(request_id = %context.request_id, "Donation intake {}", donation.id);
    Ok((StatusCode::CREATED, Json(donation)))
}

pub async fn donation_statistics(
    State(state): State<AppState>,
) -> Result<Json<DonationStatistics>, ApiError> {
    Ok(Json(state.donation_service.statistics().await?))
}
