use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct ReconciliationFailureRow {
    pub id: i64,
    pub chain_positions: serde_json::Value,
    pub db_positions: serde_json::Value,
    pub discrepancies: serde_json::Value,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

pub(crate) fn row_from_sqlite(row: SqliteRow) -> Result<ReconciliationFailureRow> {
    let chain_text: String = row.get("chain_positions");
    let db_text: String = row.get("db_positions");
    let disc_text: String = row.get("discrepancies");
    let resolved: i64 = row.get("resolved");
    let created_at_text: String = row.get("created_at");

    Ok(ReconciliationFailureRow {
        id: row.get("id"),
        chain_positions: serde_json::from_str(&chain_text).context("decode chain_positions")?,
        db_positions: serde_json::from_str(&db_text).context("decode db_positions")?,
        discrepancies: serde_json::from_str(&disc_text).context("decode discrepancies")?,
        resolved: resolved != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at_text).context("decode created_at")?.with_timezone(&Utc),
    })
}
