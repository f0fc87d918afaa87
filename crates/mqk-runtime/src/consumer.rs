//! Intent consumer (§4.1/§5): the sole mutator of position-manager state.
//! Drains the bus strictly sequentially — this serialization is the only
//! ordering guarantee the core provides — running each intent through the
//! execution service and folding `OpenPosition`/`ClosePosition` outcomes
//! back into the position manager.

use std::sync::Arc;

use chrono::Utc;
use mqk_execution::{ExecutionIntent, ExecutionOutcome, ExecutionService};
use mqk_position::{PositionManager, TrackedPosition};
use mqk_schemas::{ChainClient, OperatorAlerts, TransactionBuilder, TxSigner};
use tokio::sync::Mutex;

use crate::intent_bus::IntentConsumer;

pub async fn run<Bld, Sig, Chn, Alr>(
    mut consumer: IntentConsumer,
    service: Arc<ExecutionService<Bld, Sig, Chn, Alr>>,
    positions: Arc<Mutex<PositionManager>>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) where
    Bld: TransactionBuilder,
    Sig: TxSigner,
    Chn: ChainClient,
    Alr: OperatorAlerts,
{
    loop {
        let intent = tokio::select! {
            intent = consumer.recv() => intent,
            _ = shutdown.changed() => {
                if *shutdown.borrow() { return; }
                continue;
            }
        };

        let Some(intent) = intent else { return };
        let open_position_count = positions.lock().await.len();

        match service.execute(&intent, open_position_count).await {
            Ok(outcome) => {
                log_intent_processed(&outcome);
                handle_outcome(&intent, &outcome, &positions).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, success = false, "intent_processed");
            }
        }
    }
}

fn log_intent_processed(outcome: &ExecutionOutcome) {
    match outcome {
        ExecutionOutcome::Acknowledged => tracing::info!(success = true, dry_run = false, "intent_processed"),
        ExecutionOutcome::SkippedDuplicate => tracing::info!(success = true, skipped_duplicate = true, "intent_processed"),
        ExecutionOutcome::Simulated => tracing::info!(success = true, dry_run = true, "intent_processed"),
        ExecutionOutcome::Confirmed { tx_signature, .. } => {
            tracing::info!(success = true, dry_run = false, signature = %tx_signature, "intent_processed")
        }
    }
}

async fn handle_outcome(intent: &ExecutionIntent, outcome: &ExecutionOutcome, positions: &Arc<Mutex<PositionManager>>) {
    match (intent, outcome) {
        (ExecutionIntent::OpenPosition(op), ExecutionOutcome::Simulated | ExecutionOutcome::Confirmed { .. }) => {
            let mut guard = positions.lock().await;
            guard.open(TrackedPosition::new(
                op.idempotency_key.clone(),
                op.market,
                op.side,
                op.size_usd,
                op.collateral_usd,
                op.leverage,
                Utc::now(),
                "runtime",
            ));
        }
        (ExecutionIntent::ClosePosition(close), ExecutionOutcome::Simulated | ExecutionOutcome::Confirmed { .. }) => {
            let mut guard = positions.lock().await;
            let key = guard.iter().find(|p| p.pda.as_deref() == Some(close.position_pda.as_str())).map(|p| p.idempotency_key.clone());
            if let Some(key) = key {
                if let Some(closed) = guard.remove(&key) {
                    let pnl_usd = closed.collateral_usd * closed.unrealized_pnl_pct() / 100.0;
                    guard.record_realized_pnl(Utc::now(), pnl_usd);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent_bus::intent_bus;
    use mqk_chain_paper::{PaperAlerts, PaperBuilder, PaperChain, PaperSigner};
    use mqk_execution::{ExecutionConfig, ReconcileGate};
    use mqk_integrity::LiveControlState;
    use mqk_journal::Journal;
    use mqk_schemas::{CollateralMint, Market, Side};
    use std::sync::atomic::AtomicBool;

    struct AlwaysClean;
    impl ReconcileGate for AlwaysClean {
        fn is_clean(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn a_confirmed_open_position_registers_a_tracked_position() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Arc::new(Journal::open(&dir.path().join("events.sqlite"), None).await);
        let mut config = ExecutionConfig::sane_defaults();
        config.dry_run = true;
        let service = Arc::new(ExecutionService::new(
            journal,
            config,
            Arc::new(AtomicBool::new(false)),
            Arc::new(Mutex::new(LiveControlState::boot(None))),
            None,
            Arc::new(AlwaysClean),
            PaperBuilder,
            PaperSigner::default(),
            PaperChain::new(),
            PaperAlerts::new(),
        ));

        let positions = Arc::new(Mutex::new(PositionManager::new()));
        let (producer, consumer) = intent_bus(8);
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

        let handle = tokio::spawn(run(consumer, service, positions.clone(), shutdown_rx));

        producer.try_enqueue(ExecutionIntent::open_position(Market::SolUsd, Side::Long, CollateralMint::Usdc, 100.0, 5, 50).unwrap()).unwrap();

        // give the consumer a moment to process before tearing down.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        let _ = handle.await;

        assert_eq!(positions.lock().await.len(), 1);
    }
}
