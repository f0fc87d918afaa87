use chrono::{DateTime, NaiveDate, Utc};

/// Tracks realized P&L within the current UTC trading day and rolls over at
/// midnight UTC (§4.6.4). The position manager consults this before opening
/// a new position to enforce a daily loss limit.
#[derive(Debug, Clone)]
pub struct DailyPnlTracker {
    day: NaiveDate,
    realized_usd: f64,
}

impl DailyPnlTracker {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            day: now.date_naive(),
            realized_usd: 0.0,
        }
    }

    /// Rolls to a fresh day if `now` has crossed the UTC day boundary since
    /// the last observation. Must be called before every read or mutation.
    pub fn roll_if_needed(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if today != self.day {
            self.day = today;
            self.realized_usd = 0.0;
        }
    }

    pub fn record_realized(&mut self, now: DateTime<Utc>, pnl_usd: f64) {
        self.roll_if_needed(now);
        self.realized_usd += pnl_usd;
    }

    pub fn realized_usd(&self, now: DateTime<Utc>) -> f64 {
        if now.date_naive() != self.day {
            0.0
        } else {
            self.realized_usd
        }
    }

    pub fn daily_loss_limit_breached(&self, now: DateTime<Utc>, limit_usd: f64) -> bool {
        self.realized_usd(now) <= -limit_usd.abs()
    }
}
