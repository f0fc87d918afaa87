//! Stateless cost gate (§4.5 second half): eight ordered checks evaluated
//! purely from the candidate's numbers and a `FeeOracle`, with no access to
//! position state, the clock, or IO. Mirrors the execution gateway's
//! ordered-verdict-with-first-failure-wins pattern, but for economic
//! viability rather than system armed/disarmed state.

use mqk_schemas::FeeOracle;

#[derive(Clone, Debug, PartialEq)]
pub struct CostGateInput {
    pub leverage: u32,
    pub max_market_leverage: u32,
    pub size_usd: f64,
    pub min_notional_usd: f64,
    pub collateral_usd: f64,
    pub confidence: f64,
    pub min_confidence: f64,
    pub hold_hours_estimate: f64,
    pub expected_move_pct: Option<f64>,
    pub max_fee_to_notional_pct: f64,
    pub utilization: f64,
    pub max_utilization: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateRefusal {
    LeverageExceedsMarketMax,
    BelowMinimumNotional,
    InsufficientCollateral,
    BelowMinimumConfidence,
    NoExpectedMove,
    FeesExceedNotionalCap,
    BelowBreakevenHurdle,
    UtilizationTooHigh,
}

impl std::fmt::Display for GateRefusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateRefusal::LeverageExceedsMarketMax => "GATE_REFUSED: leverage exceeds market max",
            GateRefusal::BelowMinimumNotional => "GATE_REFUSED: size below minimum notional",
            GateRefusal::InsufficientCollateral => "GATE_REFUSED: collateral insufficient for size*leverage",
            GateRefusal::BelowMinimumConfidence => "GATE_REFUSED: signal confidence below minimum",
            GateRefusal::NoExpectedMove => "GATE_REFUSED: signal carries no expected move estimate",
            GateRefusal::FeesExceedNotionalCap => "GATE_REFUSED: estimated fees exceed notional cap",
            GateRefusal::BelowBreakevenHurdle => "GATE_REFUSED: expected move does not clear breakeven hurdle",
            GateRefusal::UtilizationTooHigh => "GATE_REFUSED: pool utilization too high",
        };
        f.write_str(s)
    }
}

impl std::error::Error for GateRefusal {}

/// Run the eight ordered checks. Returns `Ok(())` only if every check
/// passes; otherwise the first failing check's refusal.
pub fn check(input: &CostGateInput, fees: &dyn FeeOracle) -> Result<(), GateRefusal> {
    // 1. Leverage within this market's configured cap.
    if input.leverage > input.max_market_leverage {
        return Err(GateRefusal::LeverageExceedsMarketMax);
    }

    // 2. Minimum notional size.
    if input.size_usd < input.min_notional_usd {
        return Err(GateRefusal::BelowMinimumNotional);
    }

    // 3. Collateral covers the requested size at the requested leverage.
    if input.collateral_usd * input.leverage as f64 + 1e-9 < input.size_usd {
        return Err(GateRefusal::InsufficientCollateral);
    }

    // 4. Signal confidence threshold.
    if input.confidence < input.min_confidence {
        return Err(GateRefusal::BelowMinimumConfidence);
    }

    // 5. Signal must carry an expected move to evaluate breakeven against.
    let expected_move_pct = match input.expected_move_pct {
        Some(v) => v,
        None => return Err(GateRefusal::NoExpectedMove),
    };

    // 6. Estimated round-trip fees must not exceed the configured fraction
    //    of notional.
    let breakdown = fees.full_fees(input.size_usd, input.hold_hours_estimate, input.utilization);
    let fee_to_notional_pct = breakdown.total_usd / input.size_usd * 100.0;
    if fee_to_notional_pct > input.max_fee_to_notional_pct {
        return Err(GateRefusal::FeesExceedNotionalCap);
    }

    // 7. Expected favorable move must clear the fee-implied breakeven hurdle.
    let hurdle_pct = fees.minimum_win_pct(input.size_usd, input.hold_hours_estimate);
    if expected_move_pct.abs() < hurdle_pct {
        return Err(GateRefusal::BelowBreakevenHurdle);
    }

    // 8. Pool utilization must leave headroom.
    if input.utilization > input.max_utilization {
        return Err(GateRefusal::UtilizationTooHigh);
    }

    Ok(())
}
