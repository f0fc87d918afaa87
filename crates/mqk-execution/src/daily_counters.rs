//! Daily trading counters (§3.4 `stats` group): trades-today and
//! realized-P&L-today, rolled over at UTC midnight. Owned by the execution
//! service since it's the only component that observes every fill; the
//! arm/disarm stage itself is owned by `mqk-integrity`.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyCounters {
    day_ordinal: i32,
    trades_today: u32,
    realized_pnl_today_usd: f64,
}

impl DailyCounters {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { day_ordinal: now.num_days_from_ce(), trades_today: 0, realized_pnl_today_usd: 0.0 }
    }

    fn rollover_if_new_day(&mut self, now: DateTime<Utc>) {
        let today = now.num_days_from_ce();
        if today != self.day_ordinal {
            self.day_ordinal = today;
            self.trades_today = 0;
            self.realized_pnl_today_usd = 0.0;
        }
    }

    pub fn record_trade(&mut self, now: DateTime<Utc>) {
        self.rollover_if_new_day(now);
        self.trades_today += 1;
    }

    pub fn record_realized_pnl(&mut self, now: DateTime<Utc>, pnl_usd: f64) {
        self.rollover_if_new_day(now);
        self.realized_pnl_today_usd += pnl_usd;
    }

    pub fn trades_today(&self, now: DateTime<Utc>) -> u32 {
        if now.num_days_from_ce() != self.day_ordinal {
            0
        } else {
            self.trades_today
        }
    }

    pub fn realized_pnl_today_usd(&self, now: DateTime<Utc>) -> f64 {
        if now.num_days_from_ce() != self.day_ordinal {
            0.0
        } else {
            self.realized_pnl_today_usd
        }
    }

    pub fn daily_loss_limit_breached(&self, now: DateTime<Utc>, daily_loss_limit_usd: f64) -> bool {
        -self.realized_pnl_today_usd(now) > daily_loss_limit_usd
    }

    pub fn max_trades_exceeded(&self, now: DateTime<Utc>, max_trades_per_day: u32) -> bool {
        self.trades_today(now) >= max_trades_per_day
    }
}

trait NumDaysFromCe {
    fn num_days_from_ce(&self) -> i32;
}

impl NumDaysFromCe for DateTime<Utc> {
    fn num_days_from_ce(&self) -> i32 {
        use chrono::Datelike;
        self.date_naive().num_days_from_ce()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn trades_accumulate_within_the_same_day() {
        let mut c = DailyCounters::new(at(2026, 1, 1, 0));
        c.record_trade(at(2026, 1, 1, 5));
        c.record_trade(at(2026, 1, 1, 10));
        assert_eq!(c.trades_today(at(2026, 1, 1, 23)), 2);
    }

    #[test]
    fn day_rollover_at_utc_midnight_zeroes_counters() {
        let mut c = DailyCounters::new(at(2026, 1, 1, 0));
        c.record_trade(at(2026, 1, 1, 5));
        c.record_realized_pnl(at(2026, 1, 1, 5), -50.0);
        assert_eq!(c.trades_today(at(2026, 1, 2, 0)), 0);
        assert_eq!(c.realized_pnl_today_usd(at(2026, 1, 2, 0)), 0.0);
    }

    #[test]
    fn loss_limit_breach_detection() {
        let mut c = DailyCounters::new(at(2026, 1, 1, 0));
        c.record_realized_pnl(at(2026, 1, 1, 1), -600.0);
        assert!(c.daily_loss_limit_breached(at(2026, 1, 1, 2), 500.0));
        assert!(!c.daily_loss_limit_breached(at(2026, 1, 1, 2), 700.0));
    }

    #[test]
    fn max_trades_per_day_threshold() {
        let mut c = DailyCounters::new(at(2026, 1, 1, 0));
        for _ in 0..3 {
            c.record_trade(at(2026, 1, 1, 1));
        }
        assert!(c.max_trades_exceeded(at(2026, 1, 1, 2), 3));
        assert!(!c.max_trades_exceeded(at(2026, 1, 1, 2), 4));
    }
}
