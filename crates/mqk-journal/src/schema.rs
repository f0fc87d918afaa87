//! Embedded schema for the local SQLite tier. No migration runner: the
//! tables are created with `IF NOT EXISTS` on every open, which is
//! idempotent and needs no separate migrate step.

pub const CREATE_EVENTS: &str = r#"
create table if not exists events (
    key         text primary key,
    intent_type text not null,
    status      text not null,
    intent_blob text not null,
    tx_signature text,
    slot          integer,
    block_time    integer,
    error_msg     text,
    created_at  text not null,
    updated_at  text not null
)
"#;

pub const CREATE_IDEMPOTENCY_LOG: &str = r#"
create table if not exists idempotency_log (
    key          text primary key,
    processed_at text not null,
    outcome      text not null
)
"#;

pub const CREATE_RECONCILIATION_FAILURES: &str = r#"
create table if not exists reconciliation_failures (
    id              integer primary key autoincrement,
    chain_positions text not null,
    db_positions    text not null,
    discrepancies   text not null,
    resolved        integer not null default 0,
    created_at      text not null
)
"#;

pub const CREATE_EVENTS_STATUS_INDEX: &str =
    "create index if not exists idx_events_status on events(status, intent_type)";

/// Same tables on the remote (Postgres) tier. Postgres uses `serial` instead
/// of `integer primary key autoincrement` and `boolean` instead of an
/// integer flag.
pub const CREATE_EVENTS_PG: &str = r#"
create table if not exists events (
    key         text primary key,
    intent_type text not null,
    status      text not null,
    intent_blob text not null,
    tx_signature text,
    slot          bigint,
    block_time    bigint,
    error_msg     text,
    created_at  timestamptz not null,
    updated_at  timestamptz not null
)
"#;

pub const CREATE_IDEMPOTENCY_LOG_PG: &str = r#"
create table if not exists idempotency_log (
    key          text primary key,
    processed_at timestamptz not null,
    outcome      text not null
)
"#;

pub const CREATE_RECONCILIATION_FAILURES_PG: &str = r#"
create table if not exists reconciliation_failures (
    id              bigserial primary key,
    chain_positions text not null,
    db_positions    text not null,
    discrepancies   text not null,
    resolved        boolean not null default false,
    created_at      timestamptz not null
)
"#;
