//! Position monitor loop (§4.8): marks every open position against a fresh
//! oracle price, enqueues close/TP-SL intents off the resulting outcome,
//! and periodically rolls up cumulative borrow fees.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mqk_position::{ExitThresholds, MarkOutcome, PositionManager};
use mqk_schemas::{FeeOracle, Market, OraclePriceFeed};
use tokio::sync::Mutex;

use crate::intent_bus::IntentProducer;

pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_BORROW_RECOMPUTE_INTERVAL: Duration = Duration::from_secs(60);
const ORACLE_CACHE_TTL: Duration = Duration::from_secs(1);

pub struct PositionMonitorConfig {
    pub thresholds: ExitThresholds,
    pub assumed_utilization: f64,
}

struct PriceCache {
    entries: BTreeMap<Market, (f64, Instant)>,
}

impl PriceCache {
    fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    async fn get(&mut self, market: Market, oracle: &impl OraclePriceFeed) -> f64 {
        if let Some((price, fetched_at)) = self.entries.get(&market) {
            if fetched_at.elapsed() < ORACLE_CACHE_TTL {
                return *price;
            }
        }
        let price = oracle.get_price(market).await;
        self.entries.insert(market, (price, Instant::now()));
        price
    }
}

pub async fn run<Orc, Fee>(
    positions: Arc<Mutex<PositionManager>>,
    oracle: Arc<Orc>,
    fees: Arc<Fee>,
    producer: IntentProducer,
    config: PositionMonitorConfig,
    interval: Duration,
    borrow_recompute_interval: Duration,
    kill_switch: Arc<std::sync::atomic::AtomicBool>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) where
    Orc: OraclePriceFeed,
    Fee: FeeOracle,
{
    let producer = producer.named("position_monitor");
    let mut cache = PriceCache::new();
    let mut ticker = tokio::time::interval(interval);
    let mut last_borrow_recompute = Instant::now();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                mark_all(&positions, &mut cache, &oracle, &producer, &config, kill_switch.load(std::sync::atomic::Ordering::SeqCst)).await;
                attach_protection(&positions, &producer, &config).await;

                if last_borrow_recompute.elapsed() >= borrow_recompute_interval {
                    recompute_borrow_fees(&positions, &fees, &config).await;
                    last_borrow_recompute = Instant::now();
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() { return; }
            }
        }
    }
}

async fn mark_all(
    positions: &Arc<Mutex<PositionManager>>,
    cache: &mut PriceCache,
    oracle: &impl OraclePriceFeed,
    producer: &IntentProducer,
    config: &PositionMonitorConfig,
    kill_switch_active: bool,
) {
    let keys: Vec<(String, Market)> = {
        let guard = positions.lock().await;
        guard.iter().map(|p| (p.idempotency_key.clone(), p.market)).collect()
    };

    for (key, market) in keys {
        let price = cache.get(market, oracle).await;
        if price <= 0.0 {
            continue;
        }

        let now = chrono::Utc::now();
        let outcome = {
            let mut guard = positions.lock().await;
            guard.on_mark(&key, price, &config.thresholds, now, kill_switch_active)
        };

        match outcome {
            Some(MarkOutcome::ExitTriggered(trigger)) => {
                let pda = positions.lock().await.get(&key).and_then(|p| p.pda.clone());
                match pda {
                    Some(pda) => {
                        if let Ok(intent) = mqk_execution::ExecutionIntent::close_position(pda, 50) {
                            let _ = producer.try_enqueue(intent);
                        }
                        tracing::info!(idempotency_key = %key, trigger = trigger.as_str(), "exit_intent_queued");
                    }
                    None => {
                        tracing::warn!(idempotency_key = %key, trigger = trigger.as_str(), "exit_triggered_without_known_pda");
                    }
                }
            }
            Some(MarkOutcome::EntryFilled { .. }) | Some(MarkOutcome::NoOp) | None => {}
        }
    }
}

/// For positions with a filled entry and a known PDA not yet protected,
/// attach TP/SL. An immediate market close handles the race where price
/// has already crossed the stop before protection could be armed.
async fn attach_protection(positions: &Arc<Mutex<PositionManager>>, producer: &IntentProducer, config: &PositionMonitorConfig) {
    let candidates: Vec<(String, String, f64, f64, u32, mqk_schemas::Side)> = {
        let guard = positions.lock().await;
        guard
            .iter()
            .filter(|p| !p.awaiting_entry() && !p.protected && p.pda.is_some())
            .map(|p| (p.idempotency_key.clone(), p.pda.clone().unwrap(), p.entry_price, p.current_price, p.leverage, p.side))
            .collect()
    };

    for (key, pda, entry_price, current_price, leverage, side) in candidates {
        let prices = mqk_position::compute_tpsl_prices(entry_price, leverage, side, &config.thresholds);

        let already_crossed_sl = match side {
            mqk_schemas::Side::Long => current_price <= prices.stop_loss_price,
            mqk_schemas::Side::Short => current_price >= prices.stop_loss_price,
        };

        if already_crossed_sl {
            if let Ok(intent) = mqk_execution::ExecutionIntent::close_position(pda.clone(), 50) {
                let _ = producer.try_enqueue(intent);
            }
            tracing::warn!(idempotency_key = %key, pda = %pda, "panic_close");
        } else {
            if let Ok(intent) = mqk_execution::ExecutionIntent::create_tpsl(pda.clone(), prices.stop_loss_price, matches!(side, mqk_schemas::Side::Short), true, None) {
                let _ = producer.try_enqueue(intent);
            }
            if let Ok(intent) = mqk_execution::ExecutionIntent::create_tpsl(pda.clone(), prices.take_profit_price, matches!(side, mqk_schemas::Side::Long), true, None) {
                let _ = producer.try_enqueue(intent);
            }
            tracing::info!(idempotency_key = %key, pda = %pda, "tpsl_intent_queued");
        }

        let mut guard = positions.lock().await;
        if let Some(position) = guard.get_mut(&key) {
            position.protected = true;
        }
    }
}

async fn recompute_borrow_fees(positions: &Arc<Mutex<PositionManager>>, fees: &impl FeeOracle, config: &PositionMonitorConfig) {
    let rate_per_hour = fees.borrow_rate(config.assumed_utilization);
    let elapsed_hours = DEFAULT_BORROW_RECOMPUTE_INTERVAL.as_secs_f64() / 3600.0;

    let mut guard = positions.lock().await;
    for key in guard.iter().map(|p| p.idempotency_key.clone()).collect::<Vec<_>>() {
        if let Some(position) = guard.get_mut(&key) {
            if !position.awaiting_entry() {
                position.cumulative_borrow_usd += position.size_usd * rate_per_hour * elapsed_hours;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent_bus::intent_bus;
    use mqk_chain_paper::{PaperFees, PaperOracle};
    use mqk_position::TrackedPosition;
    use mqk_schemas::Side;
    use std::sync::atomic::AtomicBool;

    fn thresholds() -> ExitThresholds {
        ExitThresholds {
            take_profit_pct: 50.0,
            stop_loss_pct: 20.0,
            trailing_activation_pct: 30.0,
            trailing_drawdown_pct: 10.0,
            max_hold_hours: 48.0,
            max_borrow_pct_of_size: 5.0,
            liquidation_buffer_pct: 5.0,
        }
    }

    #[tokio::test]
    async fn a_stop_loss_mark_enqueues_a_close_intent() {
        let positions = Arc::new(Mutex::new(PositionManager::new()));
        {
            let mut guard = positions.lock().await;
            let mut pos = TrackedPosition::new("k1", Market::SolUsd, Side::Long, 1000.0, 100.0, 10, chrono::Utc::now(), "test");
            pos.pda = Some("pda1".to_string());
            guard.open(pos);
        }

        let oracle = Arc::new(PaperOracle::new());
        oracle.set_price(Market::SolUsd, 100.0);
        let fees = Arc::new(PaperFees::sane_defaults());
        let (producer, mut consumer) = intent_bus(8);
        let config = PositionMonitorConfig { thresholds: thresholds(), assumed_utilization: 0.65 };

        // First mark fills entry at 100.
        mark_all(&positions, &mut PriceCache::new(), &*oracle, &producer, &config, false).await;

        // Second mark at 98 crosses the 20%-leveraged stop (entry*0.98 == stop).
        oracle.set_price(Market::SolUsd, 98.0);
        mark_all(&positions, &mut PriceCache::new(), &*oracle, &producer, &config, false).await;

        let intent = consumer.recv().await.unwrap();
        assert!(matches!(intent, mqk_execution::ExecutionIntent::ClosePosition(_)));
        let _ = fees;
    }

    #[tokio::test]
    async fn borrow_fees_accrue_on_recompute() {
        let positions = Arc::new(Mutex::new(PositionManager::new()));
        {
            let mut guard = positions.lock().await;
            let mut pos = TrackedPosition::new("k1", Market::SolUsd, Side::Long, 1000.0, 100.0, 10, chrono::Utc::now(), "test");
            pos.entry_price = 100.0;
            guard.open(pos);
        }
        let fees = PaperFees::sane_defaults();
        let config = PositionMonitorConfig { thresholds: thresholds(), assumed_utilization: 0.65 };

        recompute_borrow_fees(&positions, &fees, &config).await;

        let guard = positions.lock().await;
        assert!(guard.get("k1").unwrap().cumulative_borrow_usd > 0.0);
        let _ = AtomicBool::new(false);
    }
}
