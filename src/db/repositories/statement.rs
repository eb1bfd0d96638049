//! SQL text for the generic entity repository
//!
//! Both drivers use `?` placeholders, so statements are built once and bound
//! per driver. Only identifiers declared on the `Entity` are ever written into
//! SQL text; every caller-supplied value is a bound argument.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::models::{
    filter_column, DateSpan, Entity, FilterValue, ListFilter, PageRequest, Reference, SqlValue,
};

/// SQL text plus its positional arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlValue>,
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn select_list<E: Entity>() -> String {
    E::COLUMNS.join(", ")
}

/// `WHERE` clause (with leading space) for `filter`, empty when unfiltered
pub fn where_clause<E: Entity>(filter: &ListFilter) -> Result<Statement> {
    let mut conditions: Vec<String> = Vec::new();
    let mut args: Vec<SqlValue> = Vec::new();

    for (key, value) in filter.equals() {
        let column = filter_column::<E>(key)
            .ok_or_else(|| anyhow!("Unknown filter field '{}' for {}", key, E::LABEL))?;
        conditions.push(format!("{} = ?", column));
        args.push(match value {
            FilterValue::Text(v) => SqlValue::Text(Some(v.clone())),
            FilterValue::Int(v) => SqlValue::Int(Some(*v)),
        });
    }

    if let Some(statuses) = filter.allowed_statuses() {
        if statuses.is_empty() {
            conditions.push("1 = 0".to_string());
        } else {
            conditions.push(format!("status IN ({})", placeholders(statuses.len())));
            args.extend(statuses.iter().map(|s| SqlValue::from(*s)));
        }
    }

    if let Some(range) = filter.date_range() {
        match E::DATE_SPAN {
            DateSpan::Single(column) => {
                if let Some(start) = range.start {
                    conditions.push(format!("DATE({}) >= ?", column));
                    args.push(start.into());
                }
                if let Some(end) = range.end {
                    conditions.push(format!("DATE({}) <= ?", column));
                    args.push(end.into());
                }
            }
            DateSpan::Span { start, end } => {
                if let Some(from) = range.start {
                    conditions.push(format!("DATE(COALESCE({}, {})) >= ?", end, start));
                    args.push(from.into());
                }
                if let Some(to) = range.end {
                    conditions.push(format!("DATE({}) <= ?", start));
                    args.push(to.into());
                }
            }
        }
    }

    let sql = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    Ok(Statement { sql, args })
}

pub fn count<E: Entity>(filter: &ListFilter) -> Result<Statement> {
    let clause = where_clause::<E>(filter)?;
    Ok(Statement {
        sql: format!("SELECT COUNT(*) FROM {}{}", E::TABLE, clause.sql),
        args: clause.args,
    })
}

/// Newest first; ids break ties between rows created in the same instant
pub fn page<E: Entity>(filter: &ListFilter, request: PageRequest) -> Result<Statement> {
    let clause = where_clause::<E>(filter)?;
    let mut args = clause.args;
    args.push(request.limit().into());
    args.push(request.offset().into());

    Ok(Statement {
        sql: format!(
            "SELECT {} FROM {}{} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            select_list::<E>(),
            E::TABLE,
            clause.sql
        ),
        args,
    })
}

pub fn by_id<E: Entity>(id: i64) -> Statement {
    Statement {
        sql: format!("SELECT {} FROM {} WHERE id = ?", select_list::<E>(), E::TABLE),
        args: vec![id.into()],
    }
}

pub fn by_slug<E: Entity>(slug: &str) -> Statement {
    Statement {
        sql: format!("SELECT {} FROM {} WHERE slug = ?", select_list::<E>(), E::TABLE),
        args: vec![slug.into()],
    }
}

pub fn slug_count<E: Entity>(slug: &str, exclude_id: Option<i64>) -> Statement {
    match exclude_id {
        Some(id) => Statement {
            sql: format!("SELECT COUNT(*) FROM {} WHERE slug = ? AND id <> ?", E::TABLE),
            args: vec![slug.into(), id.into()],
        },
        None => Statement {
            sql: format!("SELECT COUNT(*) FROM {} WHERE slug = ?", E::TABLE),
            args: vec![slug.into()],
        },
    }
}

pub fn insert<E: Entity>(input: &E::Input, now: DateTime<Utc>) -> Statement {
    let mut args = E::write_values(input);
    args.push(Some(now).into());
    args.push(Some(now).into());

    Statement {
        sql: format!(
            "INSERT INTO {} ({}, created_at, updated_at) VALUES ({})",
            E::TABLE,
            E::WRITE_COLUMNS.join(", "),
            placeholders(E::WRITE_COLUMNS.len() + 2)
        ),
        args,
    }
}

/// Full replacement of every writable column
pub fn update<E: Entity>(id: i64, input: &E::Input, now: DateTime<Utc>) -> Statement {
    let assignments: Vec<String> = E::WRITE_COLUMNS
        .iter()
        .map(|column| format!("{} = ?", column))
        .collect();

    let mut args = E::write_values(input);
    args.push(Some(now).into());
    args.push(id.into());

    Statement {
        sql: format!(
            "UPDATE {} SET {}, updated_at = ? WHERE id = ?",
            E::TABLE,
            assignments.join(", ")
        ),
        args,
    }
}

pub fn delete<E: Entity>(id: i64) -> Statement {
    Statement {
        sql: format!("DELETE FROM {} WHERE id = ?", E::TABLE),
        args: vec![id.into()],
    }
}

pub fn reference_count(reference: &Reference) -> Statement {
    Statement {
        sql: format!("SELECT COUNT(*) FROM {} WHERE id = ?", reference.table),
        args: vec![reference.id.into()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Campaign, DateRange, Donation, Post, PostInput};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_unfiltered_count() {
        let stmt = count::<Post>(&ListFilter::new()).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(*) FROM posts");
        assert!(stmt.args.is_empty());
    }

    #[test]
    fn test_equality_filters_are_conjunctive() {
        let filter = ListFilter::new().status("published").category(2);
        let stmt = where_clause::<Post>(&filter).unwrap();
        assert_eq!(stmt.sql, " WHERE status = ? AND category_id = ?");
        assert_eq!(
            stmt.args,
            vec![SqlValue::Text(Some("published".into())), SqlValue::Int(Some(2))]
        );
    }

    #[test]
    fn test_type_maps_to_entity_column() {
        let stmt = where_clause::<Donation>(&ListFilter::new().kind("paypal")).unwrap();
        assert_eq!(stmt.sql, " WHERE payment_method = ?");
    }

    #[test]
    fn test_unknown_key_is_rejected_not_interpolated() {
        let filter = ListFilter::new().eq("1=1; DROP TABLE posts; --", "x");
        assert!(where_clause::<Post>(&filter).is_err());
    }

    #[test]
    fn test_span_overlap() {
        let range = DateRange::new(Some(date("2024-03-01")), Some(date("2024-03-31"))).unwrap();
        let stmt = where_clause::<Campaign>(&ListFilter::new().between(range)).unwrap();
        assert_eq!(
            stmt.sql,
            " WHERE DATE(COALESCE(end_date, start_date)) >= ? AND DATE(start_date) <= ?"
        );
        assert_eq!(stmt.args.len(), 2);
    }

    #[test]
    fn test_single_date_range_with_open_end() {
        let range = DateRange::new(Some(date("2024-03-01")), None).unwrap();
        let stmt = where_clause::<Post>(&ListFilter::new().between(range)).unwrap();
        assert_eq!(stmt.sql, " WHERE DATE(published_at) >= ?");
    }

    #[test]
    fn test_status_in() {
        let stmt = where_clause::<Campaign>(
            &ListFilter::new().status_in(Campaign::PUBLIC_STATUSES),
        )
        .unwrap();
        assert_eq!(stmt.sql, " WHERE status IN (?, ?)");

        let stmt = where_clause::<Donation>(
            &ListFilter::new().status_in(Donation::PUBLIC_STATUSES),
        )
        .unwrap();
        assert_eq!(stmt.sql, " WHERE 1 = 0");
    }

    #[test]
    fn test_page_orders_newest_first() {
        let stmt = page::<Post>(&ListFilter::new(), PageRequest::new(3, 10)).unwrap();
        assert!(stmt
            .sql
            .ends_with("FROM posts ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"));
        assert_eq!(stmt.args, vec![SqlValue::Int(Some(10)), SqlValue::Int(Some(20))]);
    }

    #[test]
    fn test_insert_and_update_bind_every_column() {
        let input = PostInput {
            title: "Hello".into(),
            ..Default::default()
        };
        let now = Utc::now();

        let insert = insert::<Post>(&input, now);
        assert_eq!(insert.args.len(), Post::WRITE_COLUMNS.len() + 2);
        assert_eq!(insert.sql.matches('?').count(), insert.args.len());

        let update = update::<Post>(7, &input, now);
        assert_eq!(update.args.len(), Post::WRITE_COLUMNS.len() + 2);
        assert_eq!(update.sql.matches('?').count(), update.args.len());
        assert_eq!(update.args.last(), Some(&SqlValue::Int(Some(7))));
    }
}
