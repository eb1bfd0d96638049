//! Media library model
//!
//! A media record describes one uploaded file. It is created by the upload
//! endpoint and has no public slug.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_non_negative, require_text};
use super::{Entity, EntityInput, RowAccess, SqlValue, ValidationError};

status_enum!(
    MediaStatus {
        Active => "active",
        Archived => "archived",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: i64,
    pub title: String,
    pub file_name: String,
    /// Public URL path, e.g. `/uploads/<uuid>.png`
    pub file_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub alt_text: Option<String>,
    pub category_id: Option<i64>,
    pub status: MediaStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInput {
    pub title: String,
    pub file_name: String,
    pub file_path: String,
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: MediaStatus,
}

/// Editable part of a media record. The stored file fields only change
/// through a new upload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: MediaStatus,
}

impl MediaMetadata {
    /// Full replacement input that keeps `stored`'s file fields
    pub fn into_input(self, stored: &Media) -> MediaInput {
        MediaInput {
            title: self.title,
            file_name: stored.file_name.clone(),
            file_path: stored.file_path.clone(),
            mime_type: stored.mime_type.clone(),
            size_bytes: stored.size_bytes,
            alt_text: self.alt_text,
            category_id: self.category_id,
            status: self.status,
        }
    }
}

impl EntityInput for MediaInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Media title", &self.title)?;
        require_text("File name", &self.file_name)?;
        require_text("File path", &self.file_path)?;
        require_text("MIME type", &self.mime_type)?;
        require_non_negative("size_bytes", Some(self.size_bytes))
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn category_id(&self) -> Option<i64> {
        self.category_id
    }
}

impl Entity for Media {
    type Input = MediaInput;

    const TABLE: &'static str = "media";
    const LABEL: &'static str = "Media";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "file_name",
        "file_path",
        "mime_type",
        "size_bytes",
        "alt_text",
        "category_id",
        "status",
        "created_at",
        "updated_at",
    ];
    const WRITE_COLUMNS: &'static [&'static str] = &[
        "title",
        "file_name",
        "file_path",
        "mime_type",
        "size_bytes",
        "alt_text",
        "category_id",
        "status",
    ];
    const HAS_SLUG: bool = false;
    const TYPE_COLUMN: Option<&'static str> = Some("mime_type");
    const STATUSES: &'static [&'static str] = MediaStatus::NAMES;

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            file_name: row.text("file_name")?,
            file_path: row.text("file_path")?,
            mime_type: row.text("mime_type")?,
            size_bytes: row.int("size_bytes")?,
            alt_text: row.opt_text("alt_text")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &MediaInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.file_name.clone().into(),
            input.file_path.clone().into(),
            input.mime_type.clone().into(),
            input.size_bytes.into(),
            input.alt_text.clone().into(),
            input.category_id.into(),
            input.status.as_str().into(),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn status_str(&self) -> &'static str {
        self.status.as_str()
    }
}
