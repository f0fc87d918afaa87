//! Position manager (§4.6).
//!
//! Owns every `TrackedPosition` for the lifetime of the process, applies
//! mark-price ticks, evaluates the seven exit triggers, computes TP/SL
//! trigger prices at entry-fill time, and rolls over realized daily P&L at
//! the UTC day boundary. Pure deterministic logic: no IO, no chain access,
//! no clock reads beyond the `DateTime<Utc>` passed in by the caller.

pub mod daily_pnl;
pub mod fixedpoint;
pub mod tpsl;
pub mod triggers;
pub mod types;

pub use daily_pnl::DailyPnlTracker;
pub use fixedpoint::Micros;
pub use tpsl::{compute_tpsl_prices, TpSlPrices};
pub use triggers::{estimated_liquidation_price, evaluate, ExitThresholds, ExitTrigger};
pub use types::TrackedPosition;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Everything the position manager's `on_mark` callback reports back for one
/// mark-price application, so the caller (the runner) can decide whether to
/// enqueue a close intent or arm TP/SL.
#[derive(Debug, Clone)]
pub enum MarkOutcome {
    /// This tick filled the position's entry price; TP/SL prices are ready
    /// to be attached.
    EntryFilled { prices: TpSlPrices },
    /// An exit trigger fired; the caller should enqueue a `ClosePosition`
    /// intent and mark the position as pending-exit.
    ExitTriggered(ExitTrigger),
    /// Mark applied with no state transition.
    NoOp,
}

/// Owns all tracked positions, keyed by idempotency key (stable identity
/// before the on-chain PDA is known).
#[derive(Debug, Clone, Default)]
pub struct PositionManager {
    positions: BTreeMap<String, TrackedPosition>,
    daily_pnl: Option<DailyPnlTracker>,
}

impl PositionManager {
    pub fn new() -> Self {
        Self {
            positions: BTreeMap::new(),
            daily_pnl: None,
        }
    }

    pub fn open(&mut self, position: TrackedPosition) {
        self.positions.insert(position.idempotency_key.clone(), position);
    }

    pub fn get(&self, idempotency_key: &str) -> Option<&TrackedPosition> {
        self.positions.get(idempotency_key)
    }

    pub fn get_mut(&mut self, idempotency_key: &str) -> Option<&mut TrackedPosition> {
        self.positions.get_mut(idempotency_key)
    }

    pub fn remove(&mut self, idempotency_key: &str) -> Option<TrackedPosition> {
        self.positions.remove(idempotency_key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedPosition> {
        self.positions.values()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Apply a mark price to one position and evaluate its exit triggers
    /// (§4.6.1-§4.6.3). Returns `None` if no position with `idempotency_key`
    /// is tracked.
    pub fn on_mark(
        &mut self,
        idempotency_key: &str,
        price: f64,
        thresholds: &ExitThresholds,
        now: DateTime<Utc>,
        kill_switch_active: bool,
    ) -> Option<MarkOutcome> {
        let position = self.positions.get_mut(idempotency_key)?;
        let filled_entry = position.apply_mark(price);

        if filled_entry {
            let prices = compute_tpsl_prices(position.entry_price, position.leverage, position.side, thresholds);
            return Some(MarkOutcome::EntryFilled { prices });
        }

        if let Some(trigger) = evaluate(position, thresholds, now, kill_switch_active) {
            position.pending_exit = true;
            return Some(MarkOutcome::ExitTriggered(trigger));
        }

        Some(MarkOutcome::NoOp)
    }

    /// Records a closed position's realized P&L against the daily tracker,
    /// initializing the tracker on first use.
    pub fn record_realized_pnl(&mut self, now: DateTime<Utc>, pnl_usd: f64) {
        self.daily_pnl
            .get_or_insert_with(|| DailyPnlTracker::new(now))
            .record_realized(now, pnl_usd);
    }

    pub fn daily_loss_limit_breached(&mut self, now: DateTime<Utc>, limit_usd: f64) -> bool {
        match &mut self.daily_pnl {
            Some(tracker) => {
                tracker.roll_if_needed(now);
                tracker.daily_loss_limit_breached(now, limit_usd)
            }
            None => false,
        }
    }

    pub fn realized_pnl_today(&self, now: DateTime<Utc>) -> f64 {
        self.daily_pnl.as_ref().map(|t| t.realized_usd(now)).unwrap_or(0.0)
    }
}
