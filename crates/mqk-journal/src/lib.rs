//! Two-tier event journal (§3.2/§4.3): the source of truth for
//! exactly-once intent execution. Local SQLite is authoritative; a
//! networked Postgres mirror is best-effort and never blocks or fails a
//! write. If the local tier can't even be opened, the journal degrades to
//! memory-only mode and loses its idempotency guarantee — logged loudly,
//! never silently.

mod events;
mod idempotency;
mod projection;
mod reconciliation_log;
mod schema;

pub use events::{intent_kind, EventRecord, EventStatus};
pub use idempotency::IntentOutcome;
pub use projection::{fold, ProjectedPosition};
pub use reconciliation_log::ReconciliationFailureRow;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, Row, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

pub const ENV_LOCAL_DB_PATH: &str = "MQK_JOURNAL_SQLITE_PATH";
pub const ENV_REMOTE_DB_URL: &str = "MQK_JOURNAL_POSTGRES_URL";

enum LocalBacking {
    Sqlite(SqlitePool),
    MemoryOnly,
}

pub struct Journal {
    local: LocalBacking,
    remote: Option<PgPool>,
}

impl Journal {
    /// Opens the local SQLite tier (WAL mode, busy timeout) at `path` and,
    /// if `remote_url` is given, attempts to open the Postgres mirror. A
    /// local open failure never propagates: the journal falls back to
    /// memory-only mode and logs a warning instead.
    pub async fn open(path: &Path, remote_url: Option<&str>) -> Self {
        let local = match open_sqlite(path).await {
            Ok(pool) => LocalBacking::Sqlite(pool),
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "journal local tier unavailable, running memory-only: no idempotency guarantee");
                LocalBacking::MemoryOnly
            }
        };

        let remote = match remote_url {
            Some(url) => match open_postgres(url).await {
                Ok(pool) => Some(pool),
                Err(err) => {
                    tracing::debug!(error = %err, "journal remote tier unavailable at startup");
                    None
                }
            },
            None => None,
        };

        Journal { local, remote }
    }

    /// Opens using `MQK_JOURNAL_SQLITE_PATH` / `MQK_JOURNAL_POSTGRES_URL`.
    pub async fn open_from_env() -> Self {
        let path = std::env::var(ENV_LOCAL_DB_PATH).unwrap_or_else(|_| "events.sqlite".to_string());
        let remote_url = std::env::var(ENV_REMOTE_DB_URL).ok();
        Self::open(Path::new(&path), remote_url.as_deref()).await
    }

    pub fn is_memory_only(&self) -> bool {
        matches!(self.local, LocalBacking::MemoryOnly)
    }

    /// Step 4 of the execution pipeline (§4.2): conditional insert on the
    /// idempotency key. Returns `Ok(true)` if this is a new row (continue
    /// processing), `Ok(false)` if the key already exists (mark skipped and
    /// return success — the exactly-once hinge).
    pub async fn log_intent_pending(&self, key: &str, intent_type: &str, intent_blob: &serde_json::Value) -> Result<bool> {
        let pool = match &self.local {
            LocalBacking::MemoryOnly => return Ok(true),
            LocalBacking::Sqlite(pool) => pool,
        };

        let now = Utc::now();
        let blob_text = serde_json::to_string(intent_blob).context("serialize intent_blob")?;
        let result = sqlx::query(
            "insert or ignore into events (key, intent_type, status, intent_blob, created_at, updated_at) values (?, ?, ?, ?, ?, ?)",
        )
        .bind(key)
        .bind(intent_type)
        .bind(EventStatus::Pending.as_str())
        .bind(&blob_text)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(pool)
        .await
        .context("log_intent_pending local insert failed")?;

        let inserted = result.rows_affected() == 1;

        if let Some(remote) = &self.remote {
            if let Err(err) = sqlx::query(
                "insert into events (key, intent_type, status, intent_blob, created_at, updated_at) values ($1, $2, $3, $4, $5, $6) on conflict (key) do nothing",
            )
            .bind(key)
            .bind(intent_type)
            .bind(EventStatus::Pending.as_str())
            .bind(&blob_text)
            .bind(now)
            .bind(now)
            .execute(remote)
            .await
            {
                tracing::debug!(error = %err, key, "remote journal mirror write failed");
            }
        }

        Ok(inserted)
    }

    async fn set_status(
        &self,
        key: &str,
        status: EventStatus,
        tx_signature: Option<&str>,
        slot: Option<i64>,
        block_time: Option<i64>,
        error_msg: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now();
        if let LocalBacking::Sqlite(pool) = &self.local {
            sqlx::query(
                "update events set status = ?, tx_signature = coalesce(?, tx_signature), slot = coalesce(?, slot), block_time = coalesce(?, block_time), error_msg = coalesce(?, error_msg), updated_at = ? where key = ?",
            )
            .bind(status.as_str())
            .bind(tx_signature)
            .bind(slot)
            .bind(block_time)
            .bind(error_msg)
            .bind(now.to_rfc3339())
            .bind(key)
            .execute(pool)
            .await
            .context("set_status local update failed")?;
        }

        if let Some(remote) = &self.remote {
            if let Err(err) = sqlx::query(
                "update events set status = $1, tx_signature = coalesce($2, tx_signature), slot = coalesce($3, slot), block_time = coalesce($4, block_time), error_msg = coalesce($5, error_msg), updated_at = $6 where key = $7",
            )
            .bind(status.as_str())
            .bind(tx_signature)
            .bind(slot)
            .bind(block_time)
            .bind(error_msg)
            .bind(now)
            .bind(key)
            .execute(remote)
            .await
            {
                tracing::debug!(error = %err, key, "remote journal mirror status update failed");
            }
        }

        Ok(())
    }

    pub async fn mark_simulated(&self, key: &str) -> Result<()> {
        self.set_status(key, EventStatus::Simulated, None, None, None, None).await
    }

    pub async fn mark_submitted(&self, key: &str, tx_signature: &str) -> Result<()> {
        self.set_status(key, EventStatus::Submitted, Some(tx_signature), None, None, None).await
    }

    pub async fn mark_confirmed(&self, key: &str, tx_signature: &str, slot: i64, block_time: i64) -> Result<()> {
        self.set_status(key, EventStatus::Confirmed, Some(tx_signature), Some(slot), Some(block_time), None).await
    }

    /// §4.2 step 7: any exception after journal insert marks `failed` with
    /// a truncated message. The idempotency record remains — retries of the
    /// same key are skipped forever.
    pub async fn mark_failed(&self, key: &str, error_msg: &str) -> Result<()> {
        const MAX_ERROR_MSG_LEN: usize = 512;
        let truncated: String = error_msg.chars().take(MAX_ERROR_MSG_LEN).collect();
        self.set_status(key, EventStatus::Failed, None, None, None, Some(&truncated)).await
    }

    pub async fn mark_skipped(&self, key: &str) -> Result<()> {
        self.set_status(key, EventStatus::Skipped, None, None, None, None).await
    }

    /// Patches the PDA the chain assigned to a just-confirmed `OpenPosition`
    /// into its stored intent_blob, so projection replay can key it. The
    /// intent itself never carries a PDA — the chain assigns one.
    pub async fn attach_position_pda(&self, key: &str, pda: &str) -> Result<()> {
        if let LocalBacking::Sqlite(pool) = &self.local {
            let row = sqlx::query("select intent_blob from events where key = ?").bind(key).fetch_optional(pool).await.context("attach_position_pda select failed")?;
            let Some(row) = row else { return Ok(()) };
            let blob_text: String = row.get("intent_blob");
            let mut blob: serde_json::Value = serde_json::from_str(&blob_text).unwrap_or(serde_json::Value::Null);
            if let serde_json::Value::Object(ref mut map) = blob {
                map.insert("pda".to_string(), serde_json::Value::String(pda.to_string()));
            }
            let new_blob_text = serde_json::to_string(&blob).context("reserialize intent_blob")?;
            sqlx::query("update events set intent_blob = ? where key = ?").bind(&new_blob_text).bind(key).execute(pool).await.context("attach_position_pda update failed")?;
        }
        Ok(())
    }

    pub async fn record_idempotency(&self, key: &str, outcome: IntentOutcome) -> Result<()> {
        let now = Utc::now();
        if let LocalBacking::Sqlite(pool) = &self.local {
            sqlx::query("insert or replace into idempotency_log (key, processed_at, outcome) values (?, ?, ?)")
                .bind(key)
                .bind(now.to_rfc3339())
                .bind(outcome.as_str())
                .execute(pool)
                .await
                .context("record_idempotency local insert failed")?;
        }
        if let Some(remote) = &self.remote {
            if let Err(err) = sqlx::query(
                "insert into idempotency_log (key, processed_at, outcome) values ($1, $2, $3) on conflict (key) do update set processed_at = excluded.processed_at, outcome = excluded.outcome",
            )
            .bind(key)
            .bind(now)
            .bind(outcome.as_str())
            .execute(remote)
            .await
            {
                tracing::debug!(error = %err, key, "remote idempotency_log mirror write failed");
            }
        }
        Ok(())
    }

    pub async fn record_reconciliation_failure(
        &self,
        chain_positions: &serde_json::Value,
        db_positions: &serde_json::Value,
        discrepancies: &serde_json::Value,
    ) -> Result<()> {
        let now = Utc::now();
        let chain_text = serde_json::to_string(chain_positions)?;
        let db_text = serde_json::to_string(db_positions)?;
        let disc_text = serde_json::to_string(discrepancies)?;

        if let LocalBacking::Sqlite(pool) = &self.local {
            sqlx::query(
                "insert into reconciliation_failures (chain_positions, db_positions, discrepancies, resolved, created_at) values (?, ?, ?, 0, ?)",
            )
            .bind(&chain_text)
            .bind(&db_text)
            .bind(&disc_text)
            .bind(now.to_rfc3339())
            .execute(pool)
            .await
            .context("record_reconciliation_failure local insert failed")?;
        }
        if let Some(remote) = &self.remote {
            if let Err(err) = sqlx::query(
                "insert into reconciliation_failures (chain_positions, db_positions, discrepancies, resolved, created_at) values ($1, $2, $3, false, $4)",
            )
            .bind(&chain_text)
            .bind(&db_text)
            .bind(&disc_text)
            .bind(now)
            .execute(remote)
            .await
            {
                tracing::debug!(error = %err, "remote reconciliation_failures mirror write failed");
            }
        }
        Ok(())
    }

    pub async fn list_unresolved_reconciliation_failures(&self) -> Result<Vec<ReconciliationFailureRow>> {
        let LocalBacking::Sqlite(pool) = &self.local else { return Ok(Vec::new()) };
        let rows = sqlx::query(
            "select id, chain_positions, db_positions, discrepancies, resolved, created_at from reconciliation_failures where resolved = 0 order by id",
        )
        .fetch_all(pool)
        .await
        .context("list_unresolved_reconciliation_failures failed")?;

        rows.into_iter().map(reconciliation_log::row_from_sqlite).collect()
    }

    pub async fn mark_reconciliation_failure_resolved(&self, id: i64) -> Result<()> {
        if let LocalBacking::Sqlite(pool) = &self.local {
            sqlx::query("update reconciliation_failures set resolved = 1 where id = ?").bind(id).execute(pool).await.context("mark_reconciliation_failure_resolved failed")?;
        }
        Ok(())
    }

    /// §4.3: replays `confirmed`/`simulated` open/reduce/close events, in
    /// insertion order, into a `{pda -> position}` projection. Never treated
    /// as truth against the chain.
    pub async fn get_projected_positions(&self) -> Result<BTreeMap<String, ProjectedPosition>> {
        let LocalBacking::Sqlite(pool) = &self.local else { return Ok(BTreeMap::new()) };

        let rows = sqlx::query(
            "select key, intent_type, status, intent_blob, tx_signature, slot, block_time, error_msg from events where status in ('confirmed','simulated') order by rowid",
        )
        .fetch_all(pool)
        .await
        .context("get_projected_positions query failed")?;

        let events: Vec<EventRecord> = rows
            .into_iter()
            .filter_map(|row| {
                let status_str: String = row.get("status");
                let status = EventStatus::parse(&status_str)?;
                let blob_text: String = row.get("intent_blob");
                let intent_blob = serde_json::from_str(&blob_text).unwrap_or(serde_json::Value::Null);
                Some(EventRecord {
                    key: row.get("key"),
                    intent_type: row.get("intent_type"),
                    status,
                    intent_blob,
                    tx_signature: row.get("tx_signature"),
                    slot: row.get("slot"),
                    block_time: row.get("block_time"),
                    error_msg: row.get("error_msg"),
                })
            })
            .collect();

        Ok(projection::fold(&events))
    }
}

async fn open_sqlite(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))
        .context("invalid sqlite path")?
        .create_if_missing(true)
        .busy_timeout(std::time::Duration::from_secs(5))
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await.context("failed to open local journal database")?;

    for stmt in [
        schema::CREATE_EVENTS,
        schema::CREATE_IDEMPOTENCY_LOG,
        schema::CREATE_RECONCILIATION_FAILURES,
        schema::CREATE_EVENTS_STATUS_INDEX,
    ] {
        sqlx::query(stmt).execute(&pool).await.context("failed to initialize local journal schema")?;
    }

    Ok(pool)
}

async fn open_postgres(url: &str) -> Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new().max_connections(5).connect(url).await.context("failed to connect to remote journal mirror")?;

    for stmt in [schema::CREATE_EVENTS_PG, schema::CREATE_IDEMPOTENCY_LOG_PG, schema::CREATE_RECONCILIATION_FAILURES_PG] {
        sqlx::query(stmt).execute(&pool).await.context("failed to initialize remote journal schema")?;
    }

    Ok(pool)
}
