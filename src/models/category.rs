//! Category model
//!
//! Categories group every other kind of content. `kind` records what a
//! category is meant for (`post`, `event`, ...) and doubles as its `type`
//! filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_text, require_valid_slug};
use super::{Entity, EntityInput, RowAccess, SqlValue, ValidationError};

status_enum!(
    CategoryStatus {
        Active => "active",
        Inactive => "inactive",
    }
);

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub kind: String,
    pub status: CategoryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub status: CategoryStatus,
}

fn default_kind() -> String {
    "general".to_string()
}

impl EntityInput for CategoryInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Category name", &self.name)?;
        require_text("Category kind", &self.kind)?;
        require_valid_slug(self.slug.as_deref())
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn set_slug(&mut self, slug: String) {
        self.slug = Some(slug);
    }

    fn category_id(&self) -> Option<i64> {
        None
    }
}

impl Entity for Category {
    type Input = CategoryInput;

    const TABLE: &'static str = "categories";
    const LABEL: &'static str = "Category";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "slug",
        "description",
        "kind",
        "status",
        "created_at",
        "updated_at",
    ];
    const WRITE_COLUMNS: &'static [&'static str] =
        &["name", "slug", "description", "kind", "status"];
    const TYPE_COLUMN: Option<&'static str> = Some("kind");
    const STATUSES: &'static [&'static str] = CategoryStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["active"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            name: row.text("name")?,
            slug: row.text("slug")?,
            description: row.opt_text("description")?,
            kind: row.text("kind")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &CategoryInput) -> Vec<SqlValue> {
        vec![
            input.name.trim().into(),
            input.slug.clone().into(),
            input.description.clone().into(),
            input.kind.trim().to_lowercase().into(),
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
