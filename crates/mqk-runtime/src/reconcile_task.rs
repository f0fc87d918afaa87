//! Reconciliation loop (§4.7): every tick, enumerate candidate PDAs,
//! batch-fetch them from the chain, diff against the position manager's
//! local view, and record any drift. The chain always wins — a discrepancy
//! is recorded and alerted on, never auto-corrected in the projection.

use std::sync::Arc;
use std::time::Duration;

use mqk_execution::ReconcileGate;
use mqk_execution::ReconcileFreshnessGuard;
use mqk_journal::Journal;
use mqk_position::PositionManager;
use mqk_reconcile::{reconcile_monotonic, Classification, LocalPositionView, LocalSnapshot, SnapshotWatermark};
use mqk_schemas::{ChainClient, CollateralMint, Market, OperatorAlerts};
use tokio::sync::Mutex;

pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(10);
const BATCH_SIZE: usize = 100;
const MAX_ALERTED_DISCREPANCIES: usize = 10;
const ALL_MINTS: [CollateralMint; 3] = [CollateralMint::Sol, CollateralMint::Usdc, CollateralMint::Usdt];

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Bridges this loop's per-cycle clean/dirty result into the execution
/// service's LIVE-gate (`ReconcileGate::is_clean`), which otherwise has no
/// way to learn that a reconcile pass ran at all. Wraps
/// [`ReconcileFreshnessGuard`] in a `Mutex` since `ReconcileGate::is_clean`
/// takes `&self` but recording a new result needs `&mut`.
pub struct ReconcileGateHandle {
    inner: std::sync::Mutex<ReconcileFreshnessGuard<fn() -> i64>>,
}

impl ReconcileGateHandle {
    pub fn new(freshness_bound_ms: i64) -> Self {
        Self { inner: std::sync::Mutex::new(ReconcileFreshnessGuard::new(freshness_bound_ms, now_ms)) }
    }

    pub fn record_reconcile_result(&self, is_clean: bool) {
        self.inner.lock().unwrap().record_reconcile_result(is_clean);
    }
}

impl ReconcileGate for ReconcileGateHandle {
    fn is_clean(&self) -> bool {
        self.inner.lock().unwrap().is_clean()
    }
}

pub async fn run<Chn, Alr>(
    chain: Arc<Chn>,
    alerts: Arc<Alr>,
    journal: Arc<Journal>,
    positions: Arc<Mutex<PositionManager>>,
    gate: Arc<ReconcileGateHandle>,
    interval: Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) where
    Chn: ChainClient,
    Alr: OperatorAlerts,
{
    let mut watermark = SnapshotWatermark::new();
    let candidate_pdas = mqk_reconcile::enumerate_candidate_pdas(&Market::ALL, &ALL_MINTS);
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_one_cycle(&chain, &alerts, &journal, &positions, &gate, &candidate_pdas, &mut watermark).await;
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() { return; }
            }
        }
    }
}

async fn run_one_cycle<Chn, Alr>(
    chain: &Arc<Chn>,
    alerts: &Arc<Alr>,
    journal: &Arc<Journal>,
    positions: &Arc<Mutex<PositionManager>>,
    gate: &Arc<ReconcileGateHandle>,
    candidate_pdas: &[String],
    watermark: &mut SnapshotWatermark,
) where
    Chn: ChainClient,
    Alr: OperatorAlerts,
{
    let started = std::time::Instant::now();

    let snapshot = match chain.get_multiple_accounts(candidate_pdas, BATCH_SIZE).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::error!(error = %err, "reconcile_rpc_error");
            return;
        }
    };

    let local = {
        let guard = positions.lock().await;
        let mut local = LocalSnapshot::empty();
        for p in guard.iter() {
            local.positions.insert(
                p.idempotency_key.clone(),
                LocalPositionView {
                    idempotency_key: p.idempotency_key.clone(),
                    pda: p.pda.clone(),
                    side: p.side,
                    size_usd: p.size_usd,
                },
            );
        }
        local
    };

    let fetched_at_ms = chrono::Utc::now().timestamp_millis();
    let report = match reconcile_monotonic(watermark, &local, &snapshot, fetched_at_ms) {
        Ok(report) => report,
        Err(stale) => {
            tracing::warn!(watermark_ms = stale.watermark_ms, got_ms = stale.got_ms, "reconcile_snapshot_stale");
            return;
        }
    };

    let cycle_ms = started.elapsed().as_millis();
    gate.record_reconcile_result(report.is_clean());

    if report.is_clean() {
        tracing::info!(cycle_ms, discrepancies = 0, "reconciliation_cycle");
        return;
    }

    tracing::warn!(cycle_ms, discrepancies = report.classifications.len(), "reconciliation_cycle");

    let chain_json = serde_json::to_value(&snapshot.positions).unwrap_or_default();
    let local_json = serde_json::to_value(local.positions.values().map(|v| v.size_usd).collect::<Vec<_>>()).unwrap_or_default();
    let discrepancies_json = classifications_to_json(&report.classifications);
    if let Err(err) = journal.record_reconciliation_failure(&chain_json, &local_json, &discrepancies_json).await {
        tracing::error!(error = %err, "reconcile_failure_record_failed");
    }

    for classification in report.classifications.iter().take(MAX_ALERTED_DISCREPANCIES) {
        alerts.send_alert(&describe(classification)).await;
    }
}

fn classifications_to_json(classifications: &[Classification]) -> serde_json::Value {
    serde_json::Value::Array(classifications.iter().map(|c| serde_json::json!(describe(c))).collect())
}

fn describe(classification: &Classification) -> String {
    match classification {
        Classification::Ghost { pda, side, size_usd } => format!("GHOST pda={pda} side={side:?} size_usd={size_usd}"),
        Classification::Mismatch { idempotency_key, pda, local_size_usd, chain_size_usd } => {
            format!("MISMATCH key={idempotency_key} pda={pda} local={local_size_usd} chain={chain_size_usd}")
        }
        Classification::Zombie { idempotency_key, pda } => format!("ZOMBIE key={idempotency_key} pda={pda}"),
    }
}
