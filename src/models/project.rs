//! Project model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{require_non_negative, require_ordered_dates, require_text, require_valid_slug};
use super::{DateSpan, Entity, EntityInput, Reference, RowAccess, SqlValue, ValidationError};

status_enum!(
    ProjectStatus {
        Draft => "draft",
        Active => "active",
        Completed => "completed",
        Closed => "closed",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub program_id: Option<i64>,
    pub location: Option<String>,
    pub budget_cents: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub budget_cents: Option<i64>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: ProjectStatus,
}

impl EntityInput for ProjectInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Project title", &self.title)?;
        require_valid_slug(self.slug.as_deref())?;
        require_non_negative("budget_cents", self.budget_cents)?;
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

    fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self.category_id.map(Reference::category).into_iter().collect();
        if let Some(id) = self.program_id {
            refs.push(Reference {
                table: "programs",
                label: "Program",
                id,
            });
        }
        refs
    }
}

impl Entity for Project {
    type Input = ProjectInput;

    const TABLE: &'static str = "projects";
    const LABEL: &'static str = "Project";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "title",
        "slug",
        "description",
        "program_id",
        "location",
        "budget_cents",
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
        "program_id",
        "location",
        "budget_cents",
        "start_date",
        "end_date",
        "image",
        "category_id",
        "status",
    ];
    const FILTER_COLUMNS: &'static [&'static str] = &["program_id", "location"];
    const DATE_SPAN: DateSpan = DateSpan::Span {
        start: "start_date",
        end: "end_date",
    };
    const STATUSES: &'static [&'static str] = ProjectStatus::NAMES;
    const PUBLIC_STATUSES: &'static [&'static str] = &["active", "completed"];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            title: row.text("title")?,
            slug: row.text("slug")?,
            description: row.text("description")?,
            program_id: row.opt_int("program_id")?,
            location: row.opt_text("location")?,
            budget_cents: row.opt_int("budget_cents")?,
            start_date: row.opt_date("start_date")?,
            end_date: row.opt_date("end_date")?,
            image: row.opt_text("image")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &ProjectInput) -> Vec<SqlValue> {
        vec![
            input.title.trim().into(),
            input.slug.clone().into(),
            input.description.clone().into(),
            input.program_id.into(),
            input.location.clone().into(),
            input.budget_cents.into(),
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
