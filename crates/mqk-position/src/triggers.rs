use crate::types::TrackedPosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thresholds governing the seven exit triggers (§4.6.1). All percentages
/// are expressed the same way as `TrackedPosition::unrealized_pnl_pct`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitThresholds {
    pub take_profit_pct: f64,
    pub stop_loss_pct: f64,
    /// Peak P&L that must be reached before the trailing stop arms.
    pub trailing_activation_pct: f64,
    pub trailing_drawdown_pct: f64,
    pub max_hold_hours: f64,
    pub max_borrow_pct_of_size: f64,
    /// Distance from an estimated liquidation price, as a fraction of
    /// entry-to-liquidation distance, at which the position force-closes
    /// ahead of the on-chain liquidation engine.
    pub liquidation_buffer_pct: f64,
}

/// Which of the seven triggers fired, in priority order. Only the
/// highest-priority fired trigger is acted on; the rest are informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitTrigger {
    KillSwitch,
    LiquidationProximity,
    StopLoss,
    TrailingStop,
    TakeProfit,
    BorrowErosion,
    MaxHoldDuration,
}

impl ExitTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitTrigger::KillSwitch => "kill_switch",
            ExitTrigger::LiquidationProximity => "liquidation_proximity",
            ExitTrigger::StopLoss => "stop_loss",
            ExitTrigger::TrailingStop => "trailing_stop",
            ExitTrigger::TakeProfit => "take_profit",
            ExitTrigger::BorrowErosion => "borrow_erosion",
            ExitTrigger::MaxHoldDuration => "max_hold_duration",
        }
    }
}

/// Liquidation price estimate for an isolated perpetual position at
/// `leverage`, ignoring borrow accrual (a conservative, pre-accrual
/// estimate — actual on-chain liquidation may trigger slightly earlier
/// once borrow cost is included).
pub fn estimated_liquidation_price(
    entry_price: f64,
    leverage: u32,
    side: mqk_schemas::Side,
) -> f64 {
    if leverage == 0 || entry_price <= 0.0 {
        return 0.0;
    }
    let maintenance_frac = 1.0 / leverage as f64;
    match side {
        mqk_schemas::Side::Long => entry_price * (1.0 - maintenance_frac),
        mqk_schemas::Side::Short => entry_price * (1.0 + maintenance_frac),
    }
}

/// Evaluate all seven triggers against `position` and return the
/// highest-priority one that has fired, if any. `kill_switch_active` is
/// threaded in rather than read from a global so this function stays a pure
/// function of its inputs.
pub fn evaluate(
    position: &TrackedPosition,
    thresholds: &ExitThresholds,
    now: DateTime<Utc>,
    kill_switch_active: bool,
) -> Option<ExitTrigger> {
    if position.pending_exit || position.awaiting_entry() {
        return None;
    }

    if kill_switch_active {
        return Some(ExitTrigger::KillSwitch);
    }

    let liq_price = estimated_liquidation_price(position.entry_price, position.leverage, position.side);
    if liq_price > 0.0 {
        let distance_frac = match position.side {
            mqk_schemas::Side::Long => {
                (position.current_price - liq_price) / (position.entry_price - liq_price).max(f64::MIN_POSITIVE)
            }
            mqk_schemas::Side::Short => {
                (liq_price - position.current_price) / (liq_price - position.entry_price).max(f64::MIN_POSITIVE)
            }
        };
        if distance_frac <= thresholds.liquidation_buffer_pct / 100.0 {
            return Some(ExitTrigger::LiquidationProximity);
        }
    }

    let pnl_pct = position.unrealized_pnl_pct();

    if pnl_pct <= -thresholds.stop_loss_pct {
        return Some(ExitTrigger::StopLoss);
    }

    if position.peak_pnl_pct() >= thresholds.trailing_activation_pct
        && position.drawdown_from_peak_pct() >= thresholds.trailing_drawdown_pct
    {
        return Some(ExitTrigger::TrailingStop);
    }

    if pnl_pct >= thresholds.take_profit_pct {
        return Some(ExitTrigger::TakeProfit);
    }

    if position.cumulative_borrow_pct_of_size() >= thresholds.max_borrow_pct_of_size {
        return Some(ExitTrigger::BorrowErosion);
    }

    if position.hold_hours(now) >= thresholds.max_hold_hours {
        return Some(ExitTrigger::MaxHoldDuration);
    }

    None
}
