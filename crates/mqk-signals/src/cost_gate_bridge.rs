//! Bridges a merged signal to an `OpenPosition` intent (§4.2 upstream
//! boundary). The execution service's pipeline has no cost-gate step — it
//! only sees a fully-formed `ExecutionIntent` — so whatever turns a signal
//! into a position candidate is responsible for clearing the cost gate
//! first. This module is that boundary.

use mqk_execution::{ExecutionIntent, InvalidIntent};
use mqk_risk::{check_cost_gate, CostGateInput, GateRefusal};
use mqk_schemas::{CollateralMint, FeeOracle};

use crate::merge::MergedSignal;

/// Fixed economic parameters the cost gate needs that don't vary per
/// signal: market/pool limits rather than anything about the candidate
/// itself.
#[derive(Clone, Debug, PartialEq)]
pub struct CostGateFixedParams {
    pub max_market_leverage: u32,
    pub min_notional_usd: f64,
    pub min_confidence: f64,
    pub max_fee_to_notional_pct: f64,
    pub utilization: f64,
    pub max_utilization: f64,
}

impl CostGateFixedParams {
    pub fn sane_defaults() -> Self {
        Self {
            max_market_leverage: 20,
            min_notional_usd: 10.0,
            min_confidence: 0.55,
            max_fee_to_notional_pct: 2.0,
            utilization: 0.5,
            max_utilization: 0.90,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignalToIntentError {
    CostGateRefused(GateRefusal),
    InvalidIntent(InvalidIntent),
}

impl std::fmt::Display for SignalToIntentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalToIntentError::CostGateRefused(r) => write!(f, "{r}"),
            SignalToIntentError::InvalidIntent(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SignalToIntentError {}

/// Looks up expected hold hours for a given leverage tier: 24h at 2x down
/// to 1h at 20x, linearly interpolated and clamped outside that range.
pub fn hold_hours_for_leverage(leverage: u32) -> f64 {
    const MIN_LEVERAGE_TIER: f64 = 2.0;
    const MAX_LEVERAGE_TIER: f64 = 20.0;
    const MAX_HOLD_HOURS: f64 = 24.0;
    const MIN_HOLD_HOURS: f64 = 1.0;

    let lev = (leverage as f64).clamp(MIN_LEVERAGE_TIER, MAX_LEVERAGE_TIER);
    let t = (lev - MIN_LEVERAGE_TIER) / (MAX_LEVERAGE_TIER - MIN_LEVERAGE_TIER);
    MAX_HOLD_HOURS - t * (MAX_HOLD_HOURS - MIN_HOLD_HOURS)
}

/// Runs the cost gate against `signal` sized at `collateral_usd * leverage`,
/// and on success constructs the corresponding `OpenPosition` intent.
#[allow(clippy::too_many_arguments)]
pub fn build_open_position_intent(
    signal: &MergedSignal,
    collateral_mint: CollateralMint,
    collateral_usd: f64,
    leverage: u32,
    max_slippage_bps: u32,
    fixed: &CostGateFixedParams,
    fees: &dyn FeeOracle,
) -> Result<ExecutionIntent, SignalToIntentError> {
    let size_usd = collateral_usd * leverage as f64;
    let hold_hours_estimate = hold_hours_for_leverage(leverage);

    let cost_input = CostGateInput {
        leverage,
        max_market_leverage: signal.max_leverage.unwrap_or(fixed.max_market_leverage).min(fixed.max_market_leverage),
        size_usd,
        min_notional_usd: fixed.min_notional_usd,
        collateral_usd,
        confidence: signal.confidence,
        min_confidence: fixed.min_confidence,
        hold_hours_estimate,
        expected_move_pct: signal.expected_move_pct,
        max_fee_to_notional_pct: fixed.max_fee_to_notional_pct,
        utilization: fixed.utilization,
        max_utilization: fixed.max_utilization,
    };

    check_cost_gate(&cost_input, fees).map_err(SignalToIntentError::CostGateRefused)?;

    ExecutionIntent::open_position(signal.asset, signal.direction, collateral_mint, collateral_usd, leverage, max_slippage_bps)
        .map_err(SignalToIntentError::InvalidIntent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqk_schemas::{FeeBreakdown, Market, Side};

    struct CheapFees;
    impl FeeOracle for CheapFees {
        fn borrow_rate(&self, _utilization: f64) -> f64 {
            0.0001
        }
        fn full_fees(&self, notional_usd: f64, _hold_hours: f64, _utilization: f64) -> FeeBreakdown {
            let fee = notional_usd * 0.001;
            FeeBreakdown { open_usd: fee / 2.0, close_usd: fee / 2.0, borrow_usd: 0.0, impact_open_usd: 0.0, impact_close_usd: 0.0, execution_usd: 0.0, total_usd: fee }
        }
        fn minimum_win_pct(&self, _notional_usd: f64, _hold_hours: f64) -> f64 {
            0.5
        }
    }

    fn signal() -> MergedSignal {
        MergedSignal {
            asset: Market::SolUsd,
            direction: Side::Long,
            confidence: 0.75,
            expected_move_pct: Some(3.0),
            max_leverage: Some(10),
            contributing_sources: vec!["source-a".to_string()],
        }
    }

    #[test]
    fn hold_hours_interpolates_between_the_documented_endpoints() {
        assert_eq!(hold_hours_for_leverage(2), 24.0);
        assert_eq!(hold_hours_for_leverage(20), 1.0);
        assert_eq!(hold_hours_for_leverage(1), 24.0);
        assert_eq!(hold_hours_for_leverage(100), 1.0);
    }

    #[test]
    fn clearing_cost_gate_yields_an_open_position_intent() {
        let intent = build_open_position_intent(&signal(), CollateralMint::Usdc, 200.0, 5, 50, &CostGateFixedParams::sane_defaults(), &CheapFees).unwrap();
        assert!(matches!(intent, ExecutionIntent::OpenPosition(_)));
    }

    #[test]
    fn missing_expected_move_is_refused_before_intent_construction() {
        let mut s = signal();
        s.expected_move_pct = None;
        let err = build_open_position_intent(&s, CollateralMint::Usdc, 200.0, 5, 50, &CostGateFixedParams::sane_defaults(), &CheapFees).unwrap_err();
        assert!(matches!(err, SignalToIntentError::CostGateRefused(GateRefusal::NoExpectedMove)));
    }

    #[test]
    fn below_minimum_confidence_is_refused() {
        let mut s = signal();
        s.confidence = 0.10;
        let err = build_open_position_intent(&s, CollateralMint::Usdc, 200.0, 5, 50, &CostGateFixedParams::sane_defaults(), &CheapFees).unwrap_err();
        assert!(matches!(err, SignalToIntentError::CostGateRefused(GateRefusal::BelowMinimumConfidence)));
    }
}
