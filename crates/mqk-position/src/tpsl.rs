use crate::triggers::ExitThresholds;
use mqk_schemas::Side;

/// Concrete trigger prices to attach to an on-chain TP/SL request (§4.6.3),
/// derived from `entry_price`, leverage-scaled thresholds, and side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TpSlPrices {
    pub take_profit_price: f64,
    pub stop_loss_price: f64,
}

/// Converts percentage-of-equity thresholds into absolute mark prices.
/// Long positions take profit above entry and stop below it; short
/// positions are mirrored.
pub fn compute_tpsl_prices(entry_price: f64, leverage: u32, side: Side, thresholds: &ExitThresholds) -> TpSlPrices {
    let tp_frac = thresholds.take_profit_pct / 100.0 / leverage as f64;
    let sl_frac = thresholds.stop_loss_pct / 100.0 / leverage as f64;

    match side {
        Side::Long => TpSlPrices {
            take_profit_price: entry_price * (1.0 + tp_frac),
            stop_loss_price: entry_price * (1.0 - sl_frac),
        },
        Side::Short => TpSlPrices {
            take_profit_price: entry_price * (1.0 - tp_frac),
            stop_loss_price: entry_price * (1.0 + sl_frac),
        },
    }
}
