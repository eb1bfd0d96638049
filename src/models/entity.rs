//! Entity descriptions shared by every content module
//!
//! An `Entity` is a typed record stored in one table. Its associated
//! constants describe the table well enough for the generic repository to
//! count, page, insert and update it without per-entity SQL.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Input rejected before it reaches the store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Which column(s) a date-range filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpan {
    /// One date or timestamp column that must fall inside the range
    Single(&'static str),
    /// A start/end pair that must overlap the range. A missing end is
    /// treated as equal to the start.
    Span {
        start: &'static str,
        end: &'static str,
    },
}

/// A value bound into a dynamically built statement
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(Option<String>),
    Int(Option<i64>),
    Bool(bool),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(Some(value))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(Some(value.to_string()))
    }
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        SqlValue::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(Some(value))
    }
}

impl From<Option<i64>> for SqlValue {
    fn from(value: Option<i64>) -> Self {
        SqlValue::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(Some(value))
    }
}

impl From<Option<NaiveDate>> for SqlValue {
    fn from(value: Option<NaiveDate>) -> Self {
        SqlValue::Date(value)
    }
}

impl From<Option<DateTime<Utc>>> for SqlValue {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        SqlValue::Timestamp(value)
    }
}

/// Driver-neutral column access used by `Entity::from_row`
pub trait RowAccess {
    fn int(&self, column: &str) -> anyhow::Result<i64>;
    fn opt_int(&self, column: &str) -> anyhow::Result<Option<i64>>;
    fn text(&self, column: &str) -> anyhow::Result<String>;
    fn opt_text(&self, column: &str) -> anyhow::Result<Option<String>>;
    fn flag(&self, column: &str) -> anyhow::Result<bool>;
    fn date(&self, column: &str) -> anyhow::Result<NaiveDate>;
    fn opt_date(&self, column: &str) -> anyhow::Result<Option<NaiveDate>>;
    fn timestamp(&self, column: &str) -> anyhow::Result<DateTime<Utc>>;
    fn opt_timestamp(&self, column: &str) -> anyhow::Result<Option<DateTime<Utc>>>;
}

/// A reference from an input to a row in another table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub table: &'static str,
    pub label: &'static str,
    pub id: i64,
}

impl Reference {
    pub fn category(id: i64) -> Self {
        Self {
            table: "categories",
            label: "Category",
            id,
        }
    }
}

/// Submitted data for creating or fully replacing a record
pub trait EntityInput: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Field-level checks that need no database access
    fn validate(&self) -> Result<(), ValidationError>;

    /// Text the slug is derived from
    fn title(&self) -> &str;

    fn slug(&self) -> Option<&str> {
        None
    }

    fn set_slug(&mut self, _slug: String) {}

    fn category_id(&self) -> Option<i64>;

    /// Rows in other tables that must exist for this input to be stored
    fn references(&self) -> Vec<Reference> {
        self.category_id()
            .map(Reference::category)
            .into_iter()
            .collect()
    }
}

/// A persisted record type
pub trait Entity: Serialize + Clone + Send + Sync + Unpin + 'static {
    type Input: EntityInput;

    const TABLE: &'static str;

    /// Human-readable name used in error messages
    const LABEL: &'static str;

    /// Columns selected when reading a row
    const COLUMNS: &'static [&'static str];

    /// Columns written on insert/update, in `write_values` order.
    /// `created_at` and `updated_at` are managed by the repository.
    const WRITE_COLUMNS: &'static [&'static str];

    /// Equality filter keys besides `status`, `category_id` and `type`
    const FILTER_COLUMNS: &'static [&'static str] = &[];

    const DATE_SPAN: DateSpan = DateSpan::Single("created_at");

    const HAS_SLUG: bool = true;

    /// Column exposed to listings as the `type` filter
    const TYPE_COLUMN: Option<&'static str> = None;

    const STATUSES: &'static [&'static str];

    /// Statuses visible on the public site; empty means never public
    const PUBLIC_STATUSES: &'static [&'static str] = &[];

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self>;

    fn write_values(input: &Self::Input) -> Vec<SqlValue>;

    fn id(&self) -> i64;

    fn status_str(&self) -> &'static str;

    /// Fill derived input fields before a write. `existing` is the stored
    /// record on update.
    fn prepare(_input: &mut Self::Input, _existing: Option<&Self>, _now: DateTime<Utc>) {}

    fn is_public(&self) -> bool {
        Self::PUBLIC_STATUSES.contains(&self.status_str())
    }
}

/// Map a listing filter key to the column it compares, if the entity exposes it
pub fn filter_column<E: Entity>(key: &str) -> Option<&'static str> {
    match key {
        "status" => Some("status"),
        "category_id" => Some("category_id"),
        "type" => E::TYPE_COLUMN,
        _ => E::FILTER_COLUMNS.iter().copied().find(|column| *column == key),
    }
}

/// Reject blank required text
pub fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{} cannot be empty", field)));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: Option<i64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v < 0 => Err(ValidationError::new(format!(
            "{} cannot be negative",
            field
        ))),
        _ => Ok(()),
    }
}

pub fn require_ordered_dates(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(ValidationError::new("end_date cannot be before start_date"));
        }
    }
    Ok(())
}

/// Longest slug in characters; leaves room for a `-N` suffix in the
/// `VARCHAR(191)` slug columns
pub const MAX_SLUG_CHARS: usize = 150;

/// A supplied slug must already be in canonical form
pub fn require_valid_slug(slug: Option<&str>) -> Result<(), ValidationError> {
    let Some(slug) = slug else {
        return Ok(());
    };

    if slug.chars().count() > MAX_SLUG_CHARS {
        return Err(ValidationError::new(format!(
            "Slug cannot be longer than {} characters",
            MAX_SLUG_CHARS
        )));
    }
    if !is_valid_slug(slug) {
        return Err(ValidationError::new(format!(
            "Invalid slug '{}': use lowercase letters, digits and single hyphens",
            slug
        )));
    }
    Ok(())
}

/// Lowercase ASCII alphanumerics or non-ASCII letters separated by single hyphens
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|part| {
            !part.is_empty()
                && part.chars().all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || (!c.is_ascii() && c.is_alphanumeric())
                })
        })
}
