use chrono::{DateTime, Utc};
use mqk_schemas::{Market, Side};
use serde::{Deserialize, Serialize};

/// A position tracked by the position manager (§3.3). Exclusively owned by
/// the position manager — no other component mutates these fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedPosition {
    /// Idempotency key of the `OpenPosition` intent that created this
    /// position. Doubles as the position's stable identity before its
    /// on-chain PDA is known.
    pub idempotency_key: String,
    /// On-chain PDA, once known. `None` while awaiting the first
    /// reconciliation/confirmation that reveals it.
    pub pda: Option<String>,
    pub market: Market,
    pub side: Side,
    pub size_usd: f64,
    pub collateral_usd: f64,
    pub leverage: u32,
    /// Zero means "awaiting entry" (§4.6.2): no mark has been observed yet.
    pub entry_price: f64,
    pub opened_at: DateTime<Utc>,
    pub peak_price: f64,
    pub current_price: f64,
    pub source: String,
    pub cumulative_borrow_usd: f64,
    /// Set once an exit trigger has fired and a close intent is in flight;
    /// suppresses further trigger evaluation until the close resolves.
    pub pending_exit: bool,
    /// Set once TP/SL orders exist on chain for this position, or an
    /// immediate protective close has been issued (§4.6.3 race handling).
    pub protected: bool,
}

impl TrackedPosition {
    pub fn new(
        idempotency_key: impl Into<String>,
        market: Market,
        side: Side,
        size_usd: f64,
        collateral_usd: f64,
        leverage: u32,
        opened_at: DateTime<Utc>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            pda: None,
            market,
            side,
            size_usd,
            collateral_usd,
            leverage,
            entry_price: 0.0,
            opened_at,
            peak_price: 0.0,
            current_price: 0.0,
            source: source.into(),
            cumulative_borrow_usd: 0.0,
            pending_exit: false,
            protected: false,
        }
    }

    pub fn awaiting_entry(&self) -> bool {
        self.entry_price == 0.0
    }

    /// Signed price move as a fraction of entry, positive when favorable.
    fn signed_move_frac(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        match self.side {
            Side::Long => (self.current_price - self.entry_price) / self.entry_price,
            Side::Short => (self.entry_price - self.current_price) / self.entry_price,
        }
    }

    /// `unrealized_pnl_pct` (§3.3): signed move scaled by leverage, in percent.
    pub fn unrealized_pnl_pct(&self) -> f64 {
        self.signed_move_frac() * self.leverage as f64 * 100.0
    }

    /// Peak P&L implied by `peak_price`, used by the trailing-stop trigger.
    pub fn peak_pnl_pct(&self) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        let peak_move = match self.side {
            Side::Long => (self.peak_price - self.entry_price) / self.entry_price,
            Side::Short => (self.entry_price - self.peak_price) / self.entry_price,
        };
        peak_move * self.leverage as f64 * 100.0
    }

    /// `drawdown_from_peak_pct` (§3.3): always >= 0.
    pub fn drawdown_from_peak_pct(&self) -> f64 {
        (self.peak_pnl_pct() - self.unrealized_pnl_pct()).max(0.0)
    }

    pub fn hold_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.opened_at).num_seconds() as f64 / 3600.0
    }

    pub fn cumulative_borrow_pct_of_size(&self) -> f64 {
        if self.size_usd == 0.0 {
            return 0.0;
        }
        self.cumulative_borrow_usd / self.size_usd * 100.0
    }

    /// Apply a new mark price, handling entry-price fill (§4.6.2) and peak
    /// monotonicity (§3.3). Returns `true` if this tick was consumed as the
    /// entry-fill tick (no trigger evaluation should run for it).
    pub fn apply_mark(&mut self, price: f64) -> bool {
        if price <= 0.0 {
            return false;
        }
        self.current_price = price;
        if self.awaiting_entry() {
            self.entry_price = price;
            self.peak_price = price;
            return true;
        }
        match self.side {
            Side::Long => {
                if price > self.peak_price {
                    self.peak_price = price;
                }
            }
            Side::Short => {
                if price < self.peak_price {
                    self.peak_price = price;
                }
            }
        }
        false
    }
}
