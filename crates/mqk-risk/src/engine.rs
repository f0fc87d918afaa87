use crate::types::{ReasonCode, RiskConfig, RiskDecision, RiskInput};

/// Evaluate one `OpenPosition` request against the execution risk gate
/// (§4.5 first half). Checks run in a fixed order and the first failure
/// wins — kill switch and the daily loss limit outrank the static bounds
/// checks, since both represent "stop trading entirely" conditions rather
/// than "this particular request is too big".
pub fn evaluate(cfg: &RiskConfig, input: &RiskInput) -> RiskDecision {
    if input.kill_switch_active {
        return RiskDecision::reject(ReasonCode::KillSwitchActive);
    }
    if input.daily_loss_limit_breached {
        return RiskDecision::reject(ReasonCode::DailyLossLimitBreached);
    }
    if input.leverage > cfg.max_leverage {
        return RiskDecision::reject(ReasonCode::LeverageExceedsMax);
    }
    if input.size_usd > cfg.max_position_size_usd {
        return RiskDecision::reject(ReasonCode::SizeExceedsMax);
    }
    if input.open_position_count >= cfg.max_open_positions {
        return RiskDecision::reject(ReasonCode::TooManyOpenPositions);
    }
    RiskDecision::allow()
}
