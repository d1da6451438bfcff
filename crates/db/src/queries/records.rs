//! Generic per-user CRUD over the tables in the core registry.
//!
//! Every identifier spliced into SQL here comes from [`Table`] or
//! [`FieldSpec`], never from the caller. Values are always bound.

use chrono::Utc;
use cogtrain_core::{FieldKind, FieldSpec, FieldValue, Table};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite};
use uuid::Uuid;

use crate::{Database, DbError, DbResult};

/// A row rendered as a JSON object, one key per registry field.
pub type Record = Map<String, Value>;

/// Upper bound for [`Database::list_records`].
pub const MAX_RECORDS: i64 = 500;

type Query<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value<'q>(query: Query<'q>, value: &FieldValue) -> Query<'q> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::Text(s) => query.bind(s.clone()),
        FieldValue::Integer(n) => query.bind(*n),
        FieldValue::Real(f) => query.bind(*f),
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Json(s) => query.bind(s.clone()),
    }
}

fn column_list(table: Table) -> String {
    table
        .fields()
        .iter()
        .map(|f| f.name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn row_to_record(table: Table, row: &SqliteRow) -> DbResult<Record> {
    let mut out = Map::new();
    for spec in table.fields() {
        let value = match spec.kind {
            FieldKind::Text => row
                .try_get::<Option<String>, _>(spec.name)?
                .map(Value::String),
            FieldKind::Integer => row.try_get::<Option<i64>, _>(spec.name)?.map(Value::from),
            FieldKind::Real => row
                .try_get::<Option<f64>, _>(spec.name)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldKind::Boolean => row.try_get::<Option<bool>, _>(spec.name)?.map(Value::Bool),
            FieldKind::Json => match row.try_get::<Option<String>, _>(spec.name)? {
                Some(raw) => Some(serde_json::from_str(&raw)?),
                None => None,
            },
        };
        out.insert(spec.name.to_string(), value.unwrap_or(Value::Null));
    }
    Ok(out)
}

impl Database {
    /// Rows owned by `user_id`, newest first.
    pub async fn list_records(&self, table: Table, user_id: &str, limit: i64) -> DbResult<Vec<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ? ORDER BY {} DESC, id DESC LIMIT ?",
            column_list(table),
            table.name(),
            table.order_column(),
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit.clamp(1, MAX_RECORDS))
            .fetch_all(self.pool())
            .await?;

        rows.iter().map(|row| row_to_record(table, row)).collect()
    }

    /// One row by id. Rows owned by another user are reported as absent.
    pub async fn get_record(&self, table: Table, user_id: &str, id: &str) -> DbResult<Option<Record>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ? AND user_id = ?",
            column_list(table),
            table.name(),
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;

        row.map(|r| row_to_record(table, &r)).transpose()
    }

    /// Insert a validated row for `user_id`. System columns (`id`,
    /// `user_id`, timestamps) are filled here.
    pub async fn insert_record(
        &self,
        table: Table,
        user_id: &str,
        values: &[(&'static FieldSpec, FieldValue)],
    ) -> DbResult<Record> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();

        let mut columns: Vec<&str> = vec!["id", "user_id"];
        columns.extend(values.iter().map(|(spec, _)| spec.name));
        let stamps: Vec<&str> = ["created_at", "updated_at"]
            .into_iter()
            .filter(|c| table.has_column(c))
            .collect();
        columns.extend(&stamps);

        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            placeholders,
        );

        let mut query = sqlx::query(&sql).bind(id.clone()).bind(user_id.to_string());
        for (_, value) in values {
            query = bind_value(query, value);
        }
        for _ in &stamps {
            query = query.bind(now);
        }

        query.execute(self.pool()).await.map_err(|e| {
            DbError::unique_as_conflict(e, format!("{} already exists for this user", table.name()))
        })?;

        tracing::debug!(table = %table, user_id = %user_id, record_id = %id, "Record inserted");

        self.get_record(table, user_id, &id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("{} {}", table.name(), id)))
    }

    /// Apply validated field updates to a row owned by `user_id`.
    pub async fn update_record(
        &self,
        table: Table,
        user_id: &str,
        id: &str,
        values: &[(&'static FieldSpec, FieldValue)],
    ) -> DbResult<Record> {
        let mut assignments: Vec<String> = values
            .iter()
            .map(|(spec, _)| format!("{} = ?", spec.name))
            .collect();
        let touch = table.has_column("updated_at");
        if touch {
            assignments.push("updated_at = ?".to_string());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ? AND user_id = ?",
            table.name(),
            assignments.join(", "),
        );

        let mut query = sqlx::query(&sql);
        for (_, value) in values {
            query = bind_value(query, value);
        }
        if touch {
            query = query.bind(Utc::now().timestamp());
        }
        let result = query
            .bind(id.to_string())
            .bind(user_id.to_string())
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("{} {}", table.name(), id)));
        }

        tracing::debug!(table = %table, user_id = %user_id, record_id = %id, "Record updated");

        self.get_record(table, user_id, id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("{} {}", table.name(), id)))
    }
}
