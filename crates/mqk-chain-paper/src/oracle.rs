//! Deterministic "paper" price feed: configurable per-market prices with
//! no wall-clock reads. `OraclePriceFeed::get_price` returns `0.0` for an
//! unconfigured market, matching the "never an error" contract — callers
//! must treat `0.0` as "no price available" themselves.
//!
//! The trait carries no staleness parameter; staleness rejection against
//! `max_staleness_seconds` is the position-monitor loop's responsibility
//! when it reads a price's age, not this collaborator's.

use std::collections::BTreeMap;
use std::sync::Mutex;

use mqk_schemas::{Market, OraclePriceFeed};

#[derive(Default)]
pub struct PaperOracle {
    prices: Mutex<BTreeMap<Market, f64>>,
}

impl PaperOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, market: Market, price: f64) {
        self.prices.lock().unwrap().insert(market, price);
    }
}

#[async_trait::async_trait]
impl OraclePriceFeed for PaperOracle {
    async fn get_price(&self, market: Market) -> f64 {
        self.prices.lock().unwrap().get(&market).copied().unwrap_or(0.0)
    }
}
