//! Row decoding and argument binding for both drivers

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::Row;

use crate::models::{RowAccess, SqlValue};

macro_rules! impl_row_access {
    ($row:ty) => {
        impl RowAccess for $row {
            fn int(&self, column: &str) -> anyhow::Result<i64> {
                Ok(self.try_get(column)?)
            }

            fn opt_int(&self, column: &str) -> anyhow::Result<Option<i64>> {
                Ok(self.try_get(column)?)
            }

            fn text(&self, column: &str) -> anyhow::Result<String> {
                Ok(self.try_get(column)?)
            }

            fn opt_text(&self, column: &str) -> anyhow::Result<Option<String>> {
                Ok(self.try_get(column)?)
            }

            fn flag(&self, column: &str) -> anyhow::Result<bool> {
                Ok(self.try_get(column)?)
            }

            fn date(&self, column: &str) -> anyhow::Result<NaiveDate> {
                Ok(self.try_get(column)?)
            }

            fn opt_date(&self, column: &str) -> anyhow::Result<Option<NaiveDate>> {
                Ok(self.try_get(column)?)
            }

            fn timestamp(&self, column: &str) -> anyhow::Result<DateTime<Utc>> {
                Ok(self.try_get(column)?)
            }

            fn opt_timestamp(&self, column: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
                Ok(self.try_get(column)?)
            }
        }
    };
}

impl_row_access!(SqliteRow);
impl_row_access!(MySqlRow);

pub(crate) type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;
pub(crate) type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

pub(crate) fn bind_sqlite<'q>(query: SqliteQuery<'q>, value: &SqlValue) -> SqliteQuery<'q> {
    match value.clone() {
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Date(v) => query.bind(v),
        SqlValue::Timestamp(v) => query.bind(v),
    }
}

pub(crate) fn bind_mysql<'q>(query: MySqlQuery<'q>, value: &SqlValue) -> MySqlQuery<'q> {
    match value.clone() {
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Int(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Date(v) => query.bind(v),
        SqlValue::Timestamp(v) => query.bind(v),
    }
}
