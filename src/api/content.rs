//! Generic content endpoints
//!
//! Every content type shares the same public and admin handlers; the
//! `Published` trait picks the right service out of `AppState`.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::list_params;
use crate::api::middleware::{ApiError, AppState, RequestContext};
use crate::models::{
    Campaign, Category, Donation, Entity, Event, Grant, Media, Page, Post, Program, Project,
    Resource,
};
use crate::services::ContentService;

/// An entity with a content service in `AppState`
pub trait Published: Entity {
    fn service(state: &AppState) -> &ContentService<Self>;
}

macro_rules! published {
    ($($entity:ty => $field:ident),+ $(,)?) => {
        $(
            impl Published for $entity {
                fn service(state: &AppState) -> &ContentService<Self> {
                    &state.$field
                }
            }
        )+
    };
}

published!(
    Category => categories,
    Post => posts,
    Campaign => campaigns,
    Donation => donations,
    Event => events,
    Grant => grants,
    Program => programs,
    Project => projects,
    Media => media,
    Resource => resources,
);

/// `GET /` listing and `GET /{slug}` detail, public statuses only
pub fn public_router<E: Published>() -> Router<AppState> {
    Router::new()
        .route("/", get(list_public::<E>))
        .route("/{slug}", get(get_public::<E>))
}

/// Admin listing, create, detail and full replacement
pub fn admin_router<E: Published>() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_list::<E>).post(admin_create::<E>))
        .route("/{id}", get(admin_get::<E>).put(admin_update::<E>))
}

async fn list_public<E: Published>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<E>>, ApiError> {
    let (filter, page) = list_params(&params, &state.config.listing)?;
    let page = E::service(&state).list_public(filter, page).await?;
    Ok(Json(page))
}

async fn get_public<E: Published>(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<E>, ApiError> {
    Ok(Json(E::service(&state).get_public(&slug).await?))
}

pub async fn admin_list<E: Published>(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Page<E>>, ApiError> {
    let (filter, page) = list_params(&params, &state.config.listing)?;
    Ok(Json(E::service(&state).list(&filter, page).await?))
}

pub async fn admin_get<E: Published>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<E>, ApiError> {
    Ok(Json(E::service(&state).get(id).await?))
}

async fn admin_create<E: Published>(
    State(state): State<AppState>,
    context: RequestContext,
    payload: Result<Json<E::Input>, JsonRejection>,
) -> Result<(StatusCode, Json<E>), ApiError> {
    let Json(input) = payload?;
    let record = E::service(&state).create(input).await?;
    tracing::debug!(request_id = %context.request_id, "{} {} created", E::LABEL, record.id());
    Ok((StatusCode::CREATED, Json(record)))
}

async fn admin_update<E: Published>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<E::Input>, JsonRejection>,
) -> Result<Json<E>, ApiError> {
    let Json(input) = payload?;
    Ok(Json(E::service(&state).update(id, input).await?))
}

pub async fn admin_delete<E: Published>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<E>, ApiError> {
    Ok(Json(E::service(&state).delete(id).await?))
}
