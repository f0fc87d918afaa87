//! Chain reconciliation (§4.7): enumerates candidate position PDAs,
//! batch-fetches them via a `ChainClient`, and classifies every local
//! position as clean, GHOST, MISMATCH, or ZOMBIE against what the chain
//! actually reports. Drift of any kind halts execution and forces a
//! disarm; a clean reconcile is a mandatory precondition for arming LIVE.

mod engine;
mod gate;
mod types;
mod watermark;

pub use engine::reconcile;
pub use gate::{check_arm_gate, reconcile_tick, ArmStartGate, DriftAction};
pub use types::{
    enumerate_candidate_pdas, Classification, LocalPositionView, LocalSnapshot, PdaSlot,
    ReconcileReport, SIZE_MISMATCH_TOLERANCE_USD, SLOTS_PER_MARKET_MINT_SIDE,
};
pub use watermark::{SnapshotFreshness, SnapshotWatermark};

use mqk_schemas::ChainSnapshot;

/// A chain snapshot is too stale to reconcile against (§4.7/§5: the
/// reconciliation loop must not silently operate on out-of-date data).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaleChainSnapshot {
    pub watermark_ms: i64,
    pub got_ms: i64,
}

/// Monotonicity-enforced reconcile: rejects a chain snapshot fetched before
/// the last accepted one before running the diff. This is the required
/// production entry point; [`reconcile`] alone does not check freshness.
pub fn reconcile_monotonic(
    watermark: &mut SnapshotWatermark,
    local: &LocalSnapshot,
    chain: &ChainSnapshot,
    fetched_at_ms: i64,
) -> Result<ReconcileReport, StaleChainSnapshot> {
    match watermark.accept(fetched_at_ms) {
        SnapshotFreshness::Fresh => Ok(reconcile(local, chain)),
        SnapshotFreshness::Stale { watermark_ms, got_ms } => Err(StaleChainSnapshot { watermark_ms, got_ms }),
        SnapshotFreshness::NoTimestamp => Err(StaleChainSnapshot { watermark_ms: watermark.last_accepted_ms(), got_ms: 0 }),
    }
}
