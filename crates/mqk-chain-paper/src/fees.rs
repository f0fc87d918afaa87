//! Deterministic "paper" fee/hurdle oracle (§6.1, §9): a piecewise-linear
//! dual-slope borrow curve (base rate at 0 utilization, a target rate at
//! the optimal point, a steeper climb to a max rate at full utilization),
//! plus fixed open/close/impact fee rates.

use mqk_schemas::FeeBreakdown;
use mqk_schemas::FeeOracle;

#[derive(Clone, Debug, PartialEq)]
pub struct PaperFees {
    pub base_rate_per_hour: f64,
    pub optimal_utilization: f64,
    pub rate_at_optimal_per_hour: f64,
    pub max_rate_per_hour: f64,
    pub open_fee_bps: f64,
    pub close_fee_bps: f64,
    pub impact_bps_per_side: f64,
    /// Utilization assumed by `minimum_win_pct` when the caller hasn't
    /// observed live pool utilization yet.
    pub assumed_utilization: f64,
}

impl Default for PaperFees {
    fn default() -> Self {
        Self::sane_defaults()
    }
}

impl PaperFees {
    pub fn sane_defaults() -> Self {
        Self {
            base_rate_per_hour: 0.0,
            optimal_utilization: 0.70,
            rate_at_optimal_per_hour: 0.00002,
            max_rate_per_hour: 0.0002,
            open_fee_bps: 5.0,
            close_fee_bps: 8.0,
            impact_bps_per_side: 2.0,
            assumed_utilization: 0.65,
        }
    }
}

impl FeeOracle for PaperFees {
    fn borrow_rate(&self, utilization: f64) -> f64 {
        let u = utilization.clamp(0.0, 1.0);
        if u <= self.optimal_utilization {
            let t = if self.optimal_utilization > 0.0 { u / self.optimal_utilization } else { 0.0 };
            self.base_rate_per_hour + t * (self.rate_at_optimal_per_hour - self.base_rate_per_hour)
        } else {
            let span = 1.0 - self.optimal_utilization;
            let t = if span > 0.0 { (u - self.optimal_utilization) / span } else { 1.0 };
            self.rate_at_optimal_per_hour + t * (self.max_rate_per_hour - self.rate_at_optimal_per_hour)
        }
    }

    fn full_fees(&self, notional_usd: f64, hold_hours: f64, utilization: f64) -> FeeBreakdown {
        let open_usd = notional_usd * self.open_fee_bps / 10_000.0;
        let close_usd = notional_usd * self.close_fee_bps / 10_000.0;
        let borrow_usd = notional_usd * self.borrow_rate(utilization) * hold_hours;
        let impact_open_usd = notional_usd * self.impact_bps_per_side / 10_000.0;
        let impact_close_usd = notional_usd * self.impact_bps_per_side / 10_000.0;
        let execution_usd = 0.0;
        let total_usd = open_usd + close_usd + borrow_usd + impact_open_usd + impact_close_usd + execution_usd;
        FeeBreakdown { open_usd, close_usd, borrow_usd, impact_open_usd, impact_close_usd, execution_usd, total_usd }
    }

    fn minimum_win_pct(&self, notional_usd: f64, hold_hours: f64) -> f64 {
        if notional_usd <= 0.0 {
            return 0.0;
        }
        let fees = self.full_fees(notional_usd, hold_hours, self.assumed_utilization);
        fees.total_usd / notional_usd * 100.0
    }
}
