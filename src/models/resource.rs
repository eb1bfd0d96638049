//! Downloadable resource model (reports, toolkits, links)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_text, require_valid_slug};
use super::{Entity, EntityInput, RowAccess, SqlValue, ValidationError};

status_enum!(
    ResourceStatus {
        Draft => "draft",
        Published => "published",
        Archived => "archived",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub resource_type: String,
    pub file_url: Option<String>,
    pub external_url: Option<String>,
    pub category_id: Option<i64>,
    pub status: ResourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_resource_type")]
    pub resource_type: String,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: ResourceStatus,
}

fn default_resource_type() -> String {
    "document".to_string()
}

impl EntityInput for ResourceInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Resource title", &self.title)?;
        require_text("Resource type", &self.resource_type)?;
        require_valid_slug(self.slug.as_deref())
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = Some(slug);
    }

    fn category_id(&self) -> Option<i64> {
        self.category_id
    }
}

impl Entity for Resource {
    type Input = ResourceInput;

    const TABLE: &'static str = "resources";
    const LABEL: &'static str = "Resource";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "description",
        "resource_type",
        "file_url",
        "external_url",
        "category_id",
        "status",
        "created_at",
        "updated_at",
    ];
    const WRITE_COLUMNS: &'static [&'static str] = &[
        "title",
        "slug",
        "description",
        "resource_type",
        "file_url",
        "external_url",
        "category_id",
        "status",
    ];
    const TYPE_COLUMN: Option<&'static str> = Some("resource_type");
    const STATUSES: &'static [&'static str] = ResourceStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["published"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            description: row.opt_text("description")?,
            resource_type: row.text("resource_type")?,
            file_url: row.opt_text("file_url")?,
            external_url: row.opt_text("external_url")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &ResourceInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.slug.clone().into(),
            input.description.clone().into(),
            input.resource_type.trim().to_lowercase().into(),
            input.file_url.clone().into(),
            input.external_url.clone().into(),
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
