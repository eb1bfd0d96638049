//! Listing types
//!
//! `ListFilter` carries the criteria of a listing, `PageRequest` the
//! requested window and `Page` the envelope handed back to callers.

use chrono::NaiveDate;
use serde::Serialize;

use super::{filter_column, Entity, ValidationError};
use crate::config::ListingConfig;

/// Inclusive date range; either bound may be open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, ValidationError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ValidationError::new(format!(
                    "start_date {} is after end_date {}",
                    start, end
                )));
            }
        }
        Ok(Self { start, end })
    }

    /// Everything from `date` onwards
    pub fn from(date: NaiveDate) -> Self {
        Self {
            start: Some(date),
            end: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Right-hand side of an equality filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

/// Conjunctive listing criteria
///
/// Keys are logical names (`status`, `category_id`, `type`, or an
/// entity-specific key); the repository resolves them to columns and
/// rejects keys the entity does not expose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    equals: Vec<(String, FilterValue)>,
    status_in: Option<Vec<&'static str>>,
    date_range: Option<DateRange>,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key` to equal `value`
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.equals.push((key.into(), value.into()));
        self
    }

    pub fn status(self, status: impl Into<String>) -> Self {
        self.eq("status", status.into())
    }

    pub fn category(self, category_id: i64) -> Self {
        self.eq("category_id", category_id)
    }

    pub fn kind(self, kind: impl Into<String>) -> Self {
        self.eq("type", kind.into())
    }

    /// Restrict to any of the given statuses, on top of other criteria
    pub fn status_in(mut self, statuses: &'static [&'static str]) -> Self {
        self.status_in = Some(statuses.to_vec());
        self
    }

    pub fn between(mut self, range: DateRange) -> Self {
        self.date_range = if range.is_open() { None } else { Some(range) };
        self
    }

    pub fn equals(&self) -> &[(String, FilterValue)] {
        &self.equals
    }

    pub fn allowed_statuses(&self) -> Option<&[&'static str]> {
        self.status_in.as_deref()
    }

    pub fn date_range(&self) -> Option<&DateRange> {
        self.date_range.as_ref()
    }

    /// Reject keys `E` does not expose as listing filters
    pub fn check_keys<E: Entity>(&self) -> Result<(), ValidationError> {
        for (key, _) in &self.equals {
            if filter_column::<E>(key).is_none() {
                return Err(ValidationError::new(format!(
                    "Unknown filter field '{}' for {}",
                    key,
                    E::LABEL
                )));
            }
        }
        Ok(())
    }
}

/// Requested page window, always normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    /// Build a request, raising a zero page or page size to 1
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Build a request from raw query-string values.
    ///
    /// A missing or malformed page (non-numeric, zero, negative) becomes 1.
    /// A missing or malformed page size falls back to the configured
    /// default; a valid one is clamped to `[1, max_per_page]`.
    pub fn from_raw(page: Option<&str>, per_page: Option<&str>, config: &ListingConfig) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(1);

        let max = config.max_per_page.max(1);
        let per_page = per_page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .map(|p| p.clamp(1, max as i64) as u32)
            .unwrap_or_else(|| config.default_per_page.clamp(1, max));

        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, ListingConfig::default().default_per_page)
    }
}

/// Number of pages needed for `total` records; never less than 1
pub fn last_page(total: i64, per_page: u32) -> u32 {
    let per_page = per_page.max(1) as i64;
    let pages = (total.max(0) + per_page - 1) / per_page;
    pages.max(1).min(u32::MAX as i64) as u32
}

/// One page of a listing
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub current_page: u32,
    pub last_page: u32,
    pub total_count: i64,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total_count: i64, request: PageRequest) -> Self {
        Self {
            records,
            current_page: request.page,
            last_page: last_page(total_count, request.per_page),
            total_count,
            per_page: request.per_page,
        }
    }

    /// Whether no record can fall inside `request` given `total_count`
    pub fn is_past_end(total_count: i64, request: PageRequest) -> bool {
        request.page > last_page(total_count, request.per_page) || total_count == 0
    }
}
