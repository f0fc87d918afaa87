//! Liveness heartbeat (§4.1/§6.4): enqueues a `Noop` every 2 s so the
//! consumer loop and downstream journal writes never go fully quiet during
//! idle periods, and emits a structured `heartbeat` event carrying queue
//! depth, open position count, and today's realized P&L.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mqk_execution::ExecutionIntent;
use mqk_position::PositionManager;
use tokio::sync::Mutex;

use crate::intent_bus::IntentProducer;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);

pub async fn run(
    producer: IntentProducer,
    positions: Arc<Mutex<PositionManager>>,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let producer = producer.named("heartbeat");
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let _ = producer.try_enqueue(ExecutionIntent::noop());

                let (open_positions, daily_pnl_usd) = {
                    let guard = positions.lock().await;
                    (guard.len(), guard.realized_pnl_today(Utc::now()))
                };
                tracing::info!(
                    queue_depth = producer.queue_depth(),
                    open_positions,
                    daily_pnl_usd,
                    "heartbeat",
                );
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() { return; }
            }
        }
    }
}
