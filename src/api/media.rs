//! Media library endpoints
//!
//! - POST   /api/v1/admin/media - multipart upload; records a Media entry
//! - PUT    /api/v1/admin/media/{id} - replaces title, alt text, category and status
//! - DELETE /api/v1/admin/media/{id} - removes the entry and its file
//!
//! Listing and detail use the generic admin handlers.

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, Path, State,
    },
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};

use crate::api::content::{admin_get, admin_list};
use crate::api::middleware::{ApiError, AppState};
use crate::config::UploadConfig;
use crate::models::{Media, MediaInput, MediaMetadata, MediaStatus};
use crate::services::UploadError;

/// Room for multipart boundaries and the text fields next to the file
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

fn body_limit(max_file_size: u64) -> u64 {
    max_file_size.saturating_add(MULTIPART_OVERHEAD)
}

pub fn admin_router(max_file_size: u64) -> Router<AppState> {
    let limit = usize::try_from(body_limit(max_file_size)).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/",
            get(admin_list::<Media>)
                .post(upload_media)
                .layer(DefaultBodyLimit::max(limit)),
        )
        .route(
            "/{id}",
            get(admin_get::<Media>)
                .put(update_media)
                .delete(delete_media),
        )
}

/// Fields collected from the upload form
#[derive(Default)]
struct UploadForm {
    file: Option<(String, String, Vec<u8>)>,
    title: Option<String>,
    alt_text: Option<String>,
    category_id: Option<i64>,
}

/// Upload settings plus what the client declared about the request
struct UploadLimits<'a> {
    config: &'a UploadConfig,
    /// `Content-Length` of the whole multipart body
    declared_length: Option<u64>,
}

impl UploadLimits<'_> {
    fn too_large(&self, size: u64) -> ApiError {
        UploadError::TooLarge {
            size,
            max: self.config.max_file_size,
        }
        .into()
    }

    /// A body cut off by the request limit is an oversized file, not a
    /// malformed form
    fn read_error(&self, what: &str, err: MultipartError) -> ApiError {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            let size = self
                .declared_length
                .unwrap_or_else(|| body_limit(self.config.max_file_size).saturating_add(1));
            return self.too_large(size);
        }
        ApiError::validation_error(format!("Failed to read {}: {}", what, err))
    }

    /// Read the file field chunk by chunk, stopping once it passes the limit
    async fn read_file(&self, mut field: Field<'_>) -> Result<Vec<u8>, ApiError> {
        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| self.read_error("file", e))?
        {
            data.extend_from_slice(&chunk);
            let size = data.len() as u64;
            if size > self.config.max_file_size {
                return Err(self.too_large(size));
            }
        }
        Ok(data)
    }
}

async fn read_form(mut multipart: Multipart, limits: &UploadLimits<'_>) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| limits.read_error("multipart", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if !limits.config.is_type_allowed(&content_type) {
                    return Err(UploadError::InvalidType(content_type).into());
                }
                let data = limits.read_file(field).await?;
                form.file = Some((file_name, content_type, data));
            }
            "title" | "alt_text" | "category_id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| limits.read_error(&name, e))?;
                let value = value.trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "title" => form.title = Some(value),
                    "alt_text" => form.alt_text = Some(value),
                    _ => {
                        let id = value.parse::<i64>().map_err(|_| {
                            ApiError::validation_error("category_id must be an integer")
                        })?;
                        form.category_id = Some(id);
                    }
                }
            }
            _ => continue,
        }
    }

    Ok(form)
}

async fn upload_media(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Media>), ApiError> {
    let limits = UploadLimits {
        config: &state.config.upload,
        declared_length: headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok()),
    };
    let form = read_form(multipart, &limits).await?;
    let (original_name, content_type, data) = form
        .file
        .ok_or_else(|| ApiError::validation_error("No file provided"))?;

    let stored = state.uploads.store(&data, &original_name, &content_type).await?;

    let input = MediaInput {
        title: form.title.unwrap_or(original_name),
        file_name: stored.file_name.clone(),
        file_path: stored.public_path.clone(),
        mime_type: stored.mime_type.clone(),
        size_bytes: i64::try_from(stored.size).unwrap_or(i64::MAX),
        alt_text: form.alt_text,
        category_id: form.category_id,
        status: MediaStatus::Active,
    };

    match state.media.create(input).await {
        Ok(media) => Ok((StatusCode::CREATED, Json(media))),
        Err(e) => {
            // Do not leave an orphaned file behind
            if let Err(remove_err) = state.uploads.remove(&stored.public_path).await {
                tracing::warn!("Failed to clean up {}: {}", stored.public_path, remove_err);
            }
            Err(e.into())
        }
    }
}

async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<MediaMetadata>, JsonRejection>,
) -> Result<Json<Media>, ApiError> {
    let Json(metadata) = payload?;
    let stored = state.media.get(id).await?;
    let media = state.media.update(id, metadata.into_input(&stored)).await?;
    Ok(Json(media))
}

async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Media>, ApiError> {
    let media = state.media.delete(id).await?;
    if let Err(e) = state.uploads.remove(&media.file_path).await {
        tracing::error!("Media {} deleted but its file could not be removed: {}", id, e);
    }
    Ok(Json(media))
}
