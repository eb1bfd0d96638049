//! Event model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_ordered_dates, require_text, require_valid_slug};
use super::{DateSpan, Entity, EntityInput, RowAccess, SqlValue, ValidationError};

status_enum!(
    EventStatus {
        Draft => "draft",
        Published => "published",
        Cancelled => "cancelled",
        Completed => "completed",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub location: Option<String>,
    pub event_type: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub registration_url: Option<String>,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub registration_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: EventStatus,
}

fn default_event_type() -> String {
    "general".to_string()
}

impl EntityInput for EventInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Event title", &self.title)?;
        require_text("Event type", &self.event_type)?;
        require_valid_slug(self.slug.as_deref())?;
        require_ordered_dates(Some(self.start_date), self.end_date)
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

impl Entity for Event {
    type Input = EventInput;

    const TABLE: &'static str = "events";
    const LABEL: &'static str = "Event";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "description",
        "location",
        "event_type",
        "start_date",
        "end_date",
        "registration_url",
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
        "location",
        "event_type",
        "start_date",
        "end_date",
        "registration_url",
        "image",
        "category_id",
        "status",
    ];
    const FILTER_COLUMNS: &'static [&'static str] = &["location"];
    const DATE_SPAN: DateSpan = DateSpan::Span {
        start: "start_date",
        end: "end_date",
    };
    const TYPE_COLUMN: Option<&'static str> = Some("event_type");
    const STATUSES: &'static [&'static str] = EventStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["published", "completed"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            description: row.text("description")?,
            location: row.opt_text("location")?,
            event_type: row.text("event_type")?,
            start_date: row.date("start_date")?,
            end_date: row.opt_date("end_date")?,
            registration_url: row.opt_text("registration_url")?,
            image: row.opt_text("image")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &EventInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.slug.clone().into(),
            input.description.clone().into(),
            input.location.clone().into(),
            input.event_type.trim().to_lowercase().into(),
            input.start_date.into(),
            input.end_date.into(),
            input.registration_url.clone().into(),
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
