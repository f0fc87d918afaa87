//! Event record status (§3.2): a small DAG,
//! `pending -> {simulated, submitted -> confirmed | failed, failed, skipped}`,
//! monotonic per idempotency key.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Pending,
    Simulated,
    Submitted,
    Confirmed,
    Failed,
    Skipped,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Pending => "pending",
            EventStatus::Simulated => "simulated",
            EventStatus::Submitted => "submitted",
            EventStatus::Confirmed => "confirmed",
            EventStatus::Failed => "failed",
            EventStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<EventStatus> {
        match s {
            "pending" => Some(EventStatus::Pending),
            "simulated" => Some(EventStatus::Simulated),
            "submitted" => Some(EventStatus::Submitted),
            "confirmed" => Some(EventStatus::Confirmed),
            "failed" => Some(EventStatus::Failed),
            "skipped" => Some(EventStatus::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intent kind discriminants, stable across the wire and in storage.
/// Mirrors the six `ExecutionIntent` variants the execution service admits.
pub mod intent_kind {
    pub const OPEN_POSITION: &str = "open_position";
    pub const REDUCE_POSITION: &str = "reduce_position";
    pub const CLOSE_POSITION: &str = "close_position";
    pub const CREATE_TPSL: &str = "create_tpsl";
    pub const CANCEL_REQUEST: &str = "cancel_request";
    pub const NOOP: &str = "noop";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub key: String,
    pub intent_type: String,
    pub status: EventStatus,
    pub intent_blob: serde_json::Value,
    pub tx_signature: Option<String>,
    pub slot: Option<i64>,
    pub block_time: Option<i64>,
    pub error_msg: Option<String>,
}
