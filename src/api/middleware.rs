//! API middleware and shared request types
//!
//! Contains:
//! - `AppState`, the services every handler reaches through `State`
//! - `ApiError`, the JSON error envelope
//! - `RequestContext`, inserted per request and extracted by handlers
//! - The admin API-key guard

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::db::repositories::{SqlxDonationStatsRepository, SqlxRepository};
use crate::db::DynDatabasePool;
use crate::models::{
    Campaign, Category, Donation, Event, Grant, Media, Post, Program, Project, Resource,
};
use crate::services::{
    ContentService, DonationService, ServiceError, StatisticsService, UploadError, UploadStore,
};

/// Header carrying the request id in and out
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub config: Arc<Config>,
    pub categories: ContentService<Category>,
    pub posts: ContentService<Post>,
    pub campaigns: ContentService<Campaign>,
    pub donations: ContentService<Donation>,
    pub events: ContentService<Event>,
    pub grants: ContentService<Grant>,
    pub programs: ContentService<Program>,
    pub projects: ContentService<Project>,
    pub media: ContentService<Media>,
    pub resources: ContentService<Resource>,
    pub donation_service: DonationService,
    pub statistics: StatisticsService,
    pub uploads: UploadStore,
}

impl AppState {
    /// Wire every service onto `pool`
    pub fn new(pool: DynDatabasePool, config: Config) -> Self {
        let categories = ContentService::new(SqlxRepository::<Category>::boxed(pool.clone()));
        let posts = ContentService::new(SqlxRepository::<Post>::boxed(pool.clone()));
        let campaigns = ContentService::new(SqlxRepository::<Campaign>::boxed(pool.clone()));
        let donations = ContentService::new(SqlxRepository::<Donation>::boxed(pool.clone()));
        let events = ContentService::new(SqlxRepository::<Event>::boxed(pool.clone()));
        let grants = ContentService::new(SqlxRepository::<Grant>::boxed(pool.clone()));
        let programs = ContentService::new(SqlxRepository::<Program>::boxed(pool.clone()));
        let projects = ContentService::new(SqlxRepository::<Project>::boxed(pool.clone()));
        let media = ContentService::new(SqlxRepository::<Media>::boxed(pool.clone()));
        let resources = ContentService::new(SqlxRepository::<Resource>::boxed(pool.clone()));

        let donation_service = DonationService::new(
            donations.clone(),
            campaigns.clone(),
            SqlxDonationStatsRepository::boxed(pool.clone()),
        );

        let statistics = StatisticsService::new()
            .with(Arc::new(posts.clone()))
            .with(Arc::new(events.clone()))
            .with(Arc::new(programs.clone()))
            .with(Arc::new(projects.clone()))
            .with(Arc::new(campaigns.clone()))
            .with(Arc::new(donations.clone()))
            .with(Arc::new(grants.clone()))
            .with(Arc::new(resources.clone()))
            .with(Arc::new(media.clone()))
            .with(Arc::new(categories.clone()));

        let uploads = UploadStore::new(config.upload.clone());

        Self {
            pool,
            config: Arc::new(config),
            categories,
            posts,
            campaigns,
            donations,
            events,
            grants,
            programs,
            projects,
            media,
            resources,
            donation_service,
            statistics,
            uploads,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(message) => ApiError::validation_error(message),
            ServiceError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            ServiceError::Persistence(e) => {
                tracing::error!("Persistence failure: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Storage(e) => {
                tracing::error!("Upload storage failure: {}", e);
                ApiError::internal_error("Failed to store file")
            }
            UploadError::TooLarge { size, max } => ApiError::with_details(
                "VALIDATION_ERROR",
                UploadError::TooLarge { size, max }.to_string(),
                serde_json::json!({ "size": size, "max_file_size": max }),
            ),
            other => ApiError::validation_error(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_error(rejection.body_text())
    }
}

// ============================================================================
// Request context
// ============================================================================

/// Per-request data handlers can extract
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext {
                request_id: Uuid::new_v4().to_string(),
            }))
    }
}

/// Assign a request id (reusing a sane incoming one), run the request inside
/// a span carrying it, and echo it back in the response
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 64)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Extract a bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

type HmacSha256 = Hmac<Sha256>;

/// Tag for `key` over a fixed message, so keys of any length compare as
/// equal-length digests
fn key_tag(key: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes()).ok()?;
    mac.update(b"charitas-admin-key");
    Some(mac)
}

/// Constant-time check of a presented key against the configured one
fn api_key_matches(presented: &str, expected: &str) -> bool {
    let (Some(presented), Some(expected)) = (key_tag(presented), key_tag(expected)) else {
        return false;
    };
    expected
        .verify_slice(&presented.finalize().into_bytes())
        .is_ok()
}

/// Admin guard
///
/// When `admin.api_key` is configured, requests must carry it as a bearer
/// token. Without a configured key the admin routes are open.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.config.admin.api_key.as_deref() {
        let token = extract_bearer_token(&request)
            .ok_or_else(|| ApiError::unauthorized("Missing admin API key"))?;
        if !api_key_matches(token, expected) {
            tracing::warn!("Rejected admin request with a wrong API key");
            return Err(ApiError::unauthorized("Invalid admin API key"));
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use crate::models::ValidationError;

    fn request_with_auth(value: &str) -> Request {
        axum::http::Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = request_with_auth("Bearer secret-key");
        assert_eq!(extract_bearer_token(&request), Some("secret-key"));
    }

    #[test]
    fn test_extract_bearer_token_other_scheme() {
        let request = request_with_auth("Basic abc");
        assert!(extract_bearer_token(&request).is_none());
    }

    #[test]
    fn test_extract_bearer_token_missing() {
        let request = axum::http::Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        assert!(extract_bearer_token(&request).is_none());
    }

    #[test]
    fn test_api_key_matches() {
        assert!(api_key_matches("s3cret-key", "s3cret-key"));
        assert!(!api_key_matches("s3cret-kez", "s3cret-key"));
        assert!(!api_key_matches("s3cret", "s3cret-key"));
        assert!(!api_key_matches("", "s3cret-key"));
    }

    #[test]
    fn test_service_error_mapping() {
        let err: ApiError = ServiceError::from(ValidationError::new("Title cannot be empty")).into();
        assert_eq!(err.error.code, "VALIDATION_ERROR");
        assert_eq!(err.error.message, "Title cannot be empty");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = ServiceError::not_found("Post 4").into();
        assert_eq!(err.error.message, "Post 4 not found");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_persistence_error_is_generic() {
        let err: ApiError = ServiceError::from(anyhow::anyhow!("disk I/O error at /var/db")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.error.message.contains("/var/db"));
    }

    #[test]
    fn test_upload_error_mapping() {
        let err: ApiError = UploadError::InvalidType("text/html".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = UploadError::TooLarge { size: 20, max: 10 }.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error.details, Some(serde_json::json!({"size": 20, "max_file_size": 10})));

        let err: ApiError = UploadError::Storage(std::io::Error::other("full")).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
