//! Fundraising campaign model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_non_negative, require_ordered_dates, require_text, require_valid_slug};
use super::{DateSpan, Entity, EntityInput, RowAccess, SqlValue, ValidationError};

status_enum!(
    CampaignStatus {
        Draft => "draft",
        Active => "active",
        Completed => "completed",
        Closed => "closed",
        Failed => "failed",
    }
);

/// Fundraising campaign
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Campaign {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub goal_cents: i64,
    pub raised_cents: i64,
    pub currency: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub status: CampaignStatus,
    /// Share of the goal raised so far, 0-100
    pub progress_percent: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub goal_cents: i64,
    #[serde(default)]
    pub raised_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: CampaignStatus,
}

pub(crate) fn default_currency() -> String {
    "USD".to_string()
}

/// ISO 4217 style code: three ASCII letters
pub(crate) fn require_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::new(format!(
            "Invalid currency code '{}'",
            currency
        )));
    }
    Ok(())
}

/// Percentage of `goal_cents` covered by `raised_cents`.
///
/// Rounded to one decimal and clamped to `[0, 100]`; a goal of zero or less
/// yields 0.
pub fn progress_percent(raised_cents: i64, goal_cents: i64) -> f64 {
    if goal_cents <= 0 {
        return 0.0;
    }
    let percent = raised_cents as f64 / goal_cents as f64 * 100.0;
    ((percent * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

impl EntityInput for CampaignInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Campaign title", &self.title)?;
        require_valid_slug(self.slug.as_deref())?;
        require_non_negative("goal_cents", Some(self.goal_cents))?;
        require_non_negative("raised_cents", Some(self.raised_cents))?;
        require_currency(&self.currency)?;
        require_ordered_dates(self.start_date, self.end_date)
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

impl Entity for Campaign {
    type Input = CampaignInput;

    const TABLE: &'static str = "campaigns";
    const LABEL: &'static str = "Campaign";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "description",
        "goal_cents",
        "raised_cents",
        "currency",
        "start_date",
        "end_date",
        "image",
        "category_id",
        "status",
        "created_at",
        "updated_at",
    ];
    const WRITE_COLUMNS: &'static [&'static str] = &[
        "title",
        "slug",
        "description",
        "goal_cents",
        "raised_cents",
        "currency",
        "start_date",
        "end_date",
        "image",
        "category_id",
        "status",
    ];
    const FILTER_COLUMNS: &'static [&'static str] = &["currency"];
    const DATE_SPAN: DateSpan = DateSpan::Span {
        start: "start_date",
        end: "end_date",
    };
    const STATUSES: &'static [&'static str] = CampaignStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["active", "completed"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        let goal_cents = row.int("goal_cents")?;
        let raised_cents = row.int("raised_cents")?;
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            description: row.text("description")?,
            goal_cents,
            raised_cents,
            currency: row.text("currency")?,
            start_date: row.opt_date("start_date")?,
            end_date: row.opt_date("end_date")?,
            image: row.opt_text("image")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            progress_percent: progress_percent(raised_cents, goal_cents),
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &CampaignInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.slug.clone().into(),
            input.description.clone().into(),
            input.goal_cents.into(),
            input.raised_cents.into(),
            input.currency.to_uppercase().into(),
            input.start_date.into(),
            input.end_date.into(),
            input.image.clone().into(),
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
