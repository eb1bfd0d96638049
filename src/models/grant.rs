//! Grant opportunity model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_non_negative, require_text, require_valid_slug};
use super::{DateSpan, Entity, EntityInput, RowAccess, SqlValue, ValidationError};

status_enum!(
    GrantStatus {
        Draft => "draft",
        Open => "open",
        Closed => "closed",
        Awarded => "awarded",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grant {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub funder: Option<String>,
    pub grant_type: String,
    pub amount_cents: Option<i64>,
    pub deadline: Option<NaiveDate>,
    pub application_url: Option<String>,
    pub category_id: Option<i64>,
    pub status: GrantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrantInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub funder: Option<String>,
    #[serde(default = "default_grant_type")]
    pub grant_type: String,
    #[serde(default)]
    pub amount_cents: Option<i64>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: GrantStatus,
}

fn default_grant_type() -> String {
    "general".to_string()
}

impl EntityInput for GrantInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Grant title", &self.title)?;
        require_text("Grant type", &self.grant_type)?;
        require_valid_slug(self.slug.as_deref())?;
        require_non_negative("amount_cents", self.amount_cents)
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

impl Entity for Grant {
    type Input = GrantInput;

    const TABLE: &'static str = "grants";
    const LABEL: &'static str = "Grant";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "description",
        "funder",
        "grant_type",
        "amount_cents",
        "deadline",
        "application_url",
        "category_id",
        "status",
        "created_at",
        "updated_at",
    ];
    const WRITE_COLUMNS: &'static [&'static str] = &[
        "title",
        "slug",
        "description",
        "funder",
        "grant_type",
        "amount_cents",
        "deadline",
        "application_url",
        "category_id",
        "status",
    ];
    const FILTER_COLUMNS: &'static [&'static str] = &["funder"];
    const DATE_SPAN: DateSpan = DateSpan::Single("deadline");
    const TYPE_COLUMN: Option<&'static str> = Some("grant_type");
    const STATUSES: &'static [&'static str] = GrantStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["open", "closed", "awarded"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            description: row.text("description")?,
            funder: row.opt_text("funder")?,
            grant_type: row.text("grant_type")?,
            amount_cents: row.opt_int("amount_cents")?,
            deadline: row.opt_date("deadline")?,
            application_url: row.opt_text("application_url")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &GrantInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.slug.clone().into(),
            input.description.clone().into(),
            input.funder.clone().into(),
            input.grant_type.trim().to_lowercase().into(),
            input.amount_cents.into(),
            input.deadline.into(),
            input.application_url.clone().into(),
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
