//! Program model
//!
//! A program is a long-running line of work; projects may belong to one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_ordered_dates, require_text, require_valid_slug};
use super::{DateSpan, Entity, EntityInput, RowAccess, SqlValue, ValidationError};

status_enum!(
    ProgramStatus {
        Draft => "draft",
        Active => "active",
        Completed => "completed",
        Archived => "archived",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub program_type: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub status: ProgramStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgramInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_program_type")]
    pub program_type: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: ProgramStatus,
}

fn default_program_type() -> String {
    "general".to_string()
}

impl EntityInput for ProgramInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Program title", &self.title)?;
        require_text("Program type", &self.program_type)?;
        require_valid_slug(self.slug.as_deref())?;
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

impl Entity for Program {
    type Input = ProgramInput;

    const TABLE: &'static str = "programs";
    const LABEL: &'static str = "Program";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "description",
        "program_type",
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
        "program_type",
        "start_date",
        "end_date",
        "image",
        "category_id",
        "status",
    ];
    const DATE_SPAN: DateSpan = DateSpan::Span {
        start: "start_date",
        end: "end_date",
    };
    const TYPE_COLUMN: Option<&'static str> = Some("program_type");
    const STATUSES: &'static [&'static str] = ProgramStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["active", "completed"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            description: row.text("description")?,
            program_type: row.text("program_type")?,
            start_date: row.opt_date("start_date")?,
            end_date: row.opt_date("end_date")?,
            image: row.opt_text("image")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &ProgramInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.slug.clone().into(),
            input.description.clone().into(),
            input.program_type.trim().to_lowercase().into(),
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
