//! Projection replay (§4.3): folds `confirmed`/`simulated` open/reduce/close
//! events, in insertion order, into a `{pda -> position}` map. Never treated
//! as truth against the chain — reconciliation diffs it against a real
//! chain snapshot and the chain always wins.

use crate::events::{intent_kind, EventRecord, EventStatus};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedPosition {
    pub pda: String,
    pub side: String,
    pub size_usd: f64,
}

/// Folds a list of events, already ordered by insertion, into a projection.
/// `OpenPosition` rows are only foldable once a `pda` field has been
/// attached to their blob (see [`crate::Journal::attach_position_pda`]) —
/// the intent itself doesn't carry one, the chain assigns it.
pub fn fold(events: &[EventRecord]) -> BTreeMap<String, ProjectedPosition> {
    let mut positions: BTreeMap<String, ProjectedPosition> = BTreeMap::new();

    for event in events {
        if !matches!(event.status, EventStatus::Confirmed | EventStatus::Simulated) {
            continue;
        }
        match event.intent_type.as_str() {
            intent_kind::OPEN_POSITION => {
                let (Some(pda), Some(side), Some(size_usd)) = (
                    event.intent_blob.get("pda").and_then(|v| v.as_str()),
                    event.intent_blob.get("side").and_then(|v| v.as_str()),
                    event.intent_blob.get("size_usd").and_then(|v| v.as_f64()),
                ) else {
                    tracing::warn!(key = %event.key, "open_position event has no attached pda, cannot project");
                    continue;
                };
                positions.insert(
                    pda.to_string(),
                    ProjectedPosition { pda: pda.to_string(), side: side.to_string(), size_usd },
                );
            }
            intent_kind::REDUCE_POSITION => {
                let (Some(pda), Some(reduce_size_usd)) = (
                    event.intent_blob.get("position_pda").and_then(|v| v.as_str()),
                    event.intent_blob.get("reduce_size_usd").and_then(|v| v.as_f64()),
                ) else {
                    continue;
                };
                if let Some(existing) = positions.get_mut(pda) {
                    existing.size_usd -= reduce_size_usd;
                    if existing.size_usd <= 0.0 {
                        positions.remove(pda);
                    }
                }
            }
            intent_kind::CLOSE_POSITION => {
                if let Some(pda) = event.intent_blob.get("position_pda").and_then(|v| v.as_str()) {
                    positions.remove(pda);
                }
            }
            _ => {}
        }
    }

    positions
}
