//! Access log repository

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::models::{AccessLog, AccessLogChanges, AccessLogFilter, NewAccessLog};

#[derive(Debug, sqlx::FromRow)]
struct AccessLogRow {
    id: i64,
    card_id: String,
    door_name: String,
    access_granted: bool,
    timestamp: String,
}

pub struct AccessLogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccessLogRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new record. The timestamp is taken from the current clock
    /// here, never from the caller.
    pub async fn insert(&self, new: &NewAccessLog) -> Result<AccessLog> {
        // Stored at microsecond precision; the returned value is parsed back
        // from the stored form so both always agree.
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let now = parse_db_timestamp(&timestamp);

        let result = sqlx::query(
            r#"
            INSERT INTO access_logs (card_id, door_name, access_granted, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new.card_id)
        .bind(&new.door_name)
        .bind(new.access_granted)
        .bind(&timestamp)
        .execute(self.pool)
        .await
        .context("Failed to insert access log")?;

        Ok(AccessLog {
            id: result.last_insert_rowid(),
            card_id: new.card_id.clone(),
            door_name: new.door_name.clone(),
            access_granted: new.access_granted,
            timestamp: now,
        })
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<AccessLog>> {
        let row = sqlx::query_as::<_, AccessLogRow>(
            "SELECT id, card_id, door_name, access_granted, timestamp FROM access_logs WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .context("Failed to fetch access log")?;

        Ok(row.map(row_to_access_log))
    }

    /// Apply field changes to an existing record. Unsupplied fields keep
    /// their stored values; the timestamp is never touched. Returns `None`
    /// when the id is unknown.
    pub async fn update(&self, id: i64, changes: &AccessLogChanges) -> Result<Option<AccessLog>> {
        let Some(mut existing) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        if let Some(ref card_id) = changes.card_id {
            existing.card_id = card_id.clone();
        }
        if let Some(ref door_name) = changes.door_name {
            existing.door_name = door_name.clone();
        }
        if let Some(access_granted) = changes.access_granted {
            existing.access_granted = access_granted;
        }

        sqlx::query(
            "UPDATE access_logs SET card_id = ?, door_name = ?, access_granted = ? WHERE id = ?",
        )
        .bind(&existing.card_id)
        .bind(&existing.door_name)
        .bind(existing.access_granted)
        .bind(id)
        .execute(self.pool)
        .await
        .context("Failed to update access log")?;

        Ok(Some(existing))
    }

    /// Delete a record by id, reporting whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM access_logs WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .context("Failed to delete access log")?;

        Ok(result.rows_affected() > 0)
    }

    /// List records matching the filter, newest first.
    ///
    /// Each supplied filter parameter adds one conjunctive clause:
    /// `card_id` exact (case-insensitive), `door_name` substring
    /// (case-insensitive), `access_granted` exact boolean.
    pub async fn list(&self, filter: &AccessLogFilter) -> Result<Vec<AccessLog>> {
        let mut sql = String::from(
            "SELECT id, card_id, door_name, access_granted, timestamp FROM access_logs",
        );

        let mut clauses = Vec::new();
        if filter.card_id.is_some() {
            clauses.push("LOWER(card_id) = LOWER(?)");
        }
        if filter.door_name.is_some() {
            clauses.push(r"LOWER(door_name) LIKE ? ESCAPE '\'");
        }
        if filter.access_granted.is_some() {
            clauses.push("access_granted = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        // Newest first; id breaks ties between same-instant rows
        sql.push_str(" ORDER BY timestamp DESC, id DESC");

        let mut q = sqlx::query_as::<_, AccessLogRow>(&sql);
        if let Some(ref card_id) = filter.card_id {
            q = q.bind(card_id);
        }
        if let Some(ref door_name) = filter.door_name {
            q = q.bind(format!("%{}%", escape_like(&door_name.to_lowercase())));
        }
        if let Some(access_granted) = filter.access_granted {
            q = q.bind(access_granted);
        }

        let rows = q
            .fetch_all(self.pool)
            .await
            .context("Failed to list access logs")?;

        Ok(rows.into_iter().map(row_to_access_log).collect())
    }
}

/// Escape LIKE metacharacters so the filter term matches literally
fn escape_like(term: &str) -> String {
    term.replace('\\', r"\\")
        .replace('%', r"\%")
        .replace('_', r"\_")
}

fn parse_db_timestamp(ts: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S") {
        return DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
    }
    Utc::now()
}

fn row_to_access_log(row: AccessLogRow) -> AccessLog {
    AccessLog {
        id: row.id,
        card_id: row.card_id,
        door_name: row.door_name,
        access_granted: row.access_granted,
        timestamp: parse_db_timestamp(&row.timestamp),
    }
}
