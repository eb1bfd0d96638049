//! Listing query parsing shared by every listing endpoint
//!
//! Query strings are taken as raw key/value pairs so a malformed page number
//! can be coerced instead of rejected.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::api::middleware::ApiError;
use crate::config::ListingConfig;
use crate::models::{DateRange, FilterValue, ListFilter, PageRequest};

/// Keys consumed by pagination and the date range rather than equality filters
const RESERVED_KEYS: &[&str] = &["page", "per_page", "start_date", "end_date"];

/// Turn raw query parameters into a filter and a page request.
///
/// Empty values are ignored. Keys ending in `_id` must be integers. Whether
/// the remaining keys are valid for the entity is checked by the service.
pub fn list_params(
    params: &HashMap<String, String>,
    listing: &ListingConfig,
) -> Result<(ListFilter, PageRequest), ApiError> {
    let page = PageRequest::from_raw(
        params.get("page").map(String::as_str),
        params.get("per_page").map(String::as_str),
        listing,
    );

    let range = DateRange::new(
        parse_date(params, "start_date")?,
        parse_date(params, "end_date")?,
    )
    .map_err(|e| ApiError::validation_error(e.to_string()))?;

    // Sorted so the generated SQL is stable for equal queries
    let mut keys: Vec<&String> = params
        .keys()
        .filter(|key| !RESERVED_KEYS.contains(&key.as_str()))
        .collect();
    keys.sort();

    let mut filter = ListFilter::new();
    for key in keys {
        let value = params[key].trim();
        if value.is_empty() {
            continue;
        }
        filter = filter.eq(key.as_str(), filter_value(key, value)?);
    }

    Ok((filter.between(range), page))
}

fn filter_value(key: &str, value: &str) -> Result<FilterValue, ApiError> {
    if key.ends_with("_id") {
        let id = value
            .parse::<i64>()
            .map_err(|_| ApiError::validation_error(format!("{} must be an integer", key)))?;
        return Ok(FilterValue::Int(id));
    }
    Ok(FilterValue::Text(value.to_string()))
}

fn parse_date(params: &HashMap<String, String>, key: &str) -> Result<Option<NaiveDate>, ApiError> {
    match params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ApiError::validation_error(format!("{} must be a date (YYYY-MM-DD), got '{}'", key, raw))
            }),
    }
}
