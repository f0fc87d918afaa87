/// Execution-service risk gate configuration: kill switch + size/leverage
/// bounds (§4.5 first half). Independent of the stateless cost gate.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskConfig {
    pub max_leverage: u32,
    pub max_position_size_usd: f64,
    pub max_open_positions: usize,
    pub daily_loss_limit_usd: f64,
}

impl RiskConfig {
    pub fn sane_defaults() -> Self {
        Self {
            max_leverage: 10,
            max_position_size_usd: 5_000.0,
            max_open_positions: 5,
            daily_loss_limit_usd: 1_000.0,
        }
    }
}

/// Inputs for one `OpenPosition` risk evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskInput {
    pub leverage: u32,
    pub size_usd: f64,
    pub open_position_count: usize,
    pub kill_switch_active: bool,
    pub daily_loss_limit_breached: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskAction {
    Allow,
    Reject,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReasonCode {
    Allowed,
    KillSwitchActive,
    DailyLossLimitBreached,
    LeverageExceedsMax,
    SizeExceedsMax,
    TooManyOpenPositions,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::Allowed => "allowed",
            ReasonCode::KillSwitchActive => "kill_switch_active",
            ReasonCode::DailyLossLimitBreached => "daily_loss_limit_breached",
            ReasonCode::LeverageExceedsMax => "leverage_exceeds_max",
            ReasonCode::SizeExceedsMax => "size_exceeds_max",
            ReasonCode::TooManyOpenPositions => "too_many_open_positions",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RiskDecision {
    pub action: RiskAction,
    pub reason: ReasonCode,
}

impl RiskDecision {
    pub fn allow() -> Self {
        Self {
            action: RiskAction::Allow,
            reason: ReasonCode::Allowed,
        }
    }

    pub fn reject(reason: ReasonCode) -> Self {
        Self {
            action: RiskAction::Reject,
            reason,
        }
    }
}
