//! Minimal in-memory stand-ins for the six collaborator traits, used only to
//! exercise `ExecutionService` end to end without a real chain or wallet.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use mqk_execution::{ExecutionConfig, ExecutionService, ReconcileFreshnessGuard, ReconcileGate};
use mqk_integrity::LiveControlState;
use mqk_journal::Journal;
use mqk_schemas::{ChainClient, ChainSnapshot, OperatorAlerts, TransactionBuilder, TxSigner, TxStatus};
use tokio::sync::Mutex;

pub struct StubBuilder;
impl TransactionBuilder for StubBuilder {
    fn build(&self, _intent_json: &serde_json::Value, _wallet_addr: &str) -> anyhow::Result<Vec<u8>> {
        Ok(vec![1, 2, 3])
    }
}

pub struct StubSigner;
impl TxSigner for StubSigner {
    fn sign(&self, _unsigned_tx: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(vec![9, 9, 9])
    }
    fn wallet_address(&self) -> String {
        "test-wallet".to_string()
    }
}

#[derive(Clone, Default)]
pub struct StubChain {
    submits: Arc<AtomicUsize>,
}

impl StubChain {
    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChainClient for StubChain {
    async fn get_multiple_accounts(&self, _pdas: &[String], _batch_size: usize) -> anyhow::Result<ChainSnapshot> {
        Ok(ChainSnapshot::default())
    }

    async fn send_raw_transaction(&self, _signed_tx: &[u8]) -> anyhow::Result<String> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok("test-signature".to_string())
    }

    async fn get_signature_status(&self, _signature: &str) -> anyhow::Result<Option<TxStatus>> {
        Ok(Some(TxStatus::Confirmed { slot: 1, block_time: 0 }))
    }
}

#[derive(Clone, Default)]
pub struct StubAlerts {
    pub sent: Arc<std::sync::Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl OperatorAlerts for StubAlerts {
    async fn send_alert(&self, text: &str) {
        self.sent.lock().unwrap().push(text.to_string());
    }
}

pub struct AlwaysClean;
impl ReconcileGate for AlwaysClean {
    fn is_clean(&self) -> bool {
        true
    }
}

pub struct Harness {
    pub service: ExecutionService<StubBuilder, StubSigner, StubChain, StubAlerts>,
    pub chain: StubChain,
    pub alerts: StubAlerts,
    pub live_control: Arc<Mutex<LiveControlState>>,
}

/// Builds a harness with an in-memory-backed journal and an always-clean
/// reconcile gate. `live_mode` implies an armed live-control state so the
/// live gate in the calling test only needs to poke the daily counters.
pub async fn service_with_defaults(dry_run: bool, live_mode: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let journal = Arc::new(Journal::open(&dir.path().join("events.sqlite"), None).await);

    let live_control = if live_mode {
        Arc::new(Mutex::new(LiveControlState::Armed { armed_at: chrono::Utc::now() }))
    } else {
        Arc::new(Mutex::new(LiveControlState::boot(None)))
    };

    let chain = StubChain::default();
    let alerts = StubAlerts::default();

    let mut config = ExecutionConfig::sane_defaults();
    config.dry_run = dry_run;
    config.live_mode = live_mode;

    let service = ExecutionService::new(
        journal,
        config,
        Arc::new(AtomicBool::new(false)),
        live_control.clone(),
        None,
        Arc::new(AlwaysClean) as Arc<dyn ReconcileGate>,
        StubBuilder,
        StubSigner,
        chain.clone(),
        alerts.clone(),
    );

    Harness { service, chain, alerts, live_control }
}

#[allow(dead_code)]
pub fn freshness_guard() -> ReconcileFreshnessGuard<fn() -> i64> {
    ReconcileFreshnessGuard::new(60_000, || 0)
}
