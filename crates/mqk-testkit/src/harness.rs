use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use mqk_chain_paper::{PaperAlerts, PaperBuilder, PaperChain, PaperSigner};
use mqk_execution::{ExecutionConfig, ExecutionService, ReconcileGate};
use mqk_integrity::LiveControlState;
use mqk_journal::Journal;
use tokio::sync::Mutex;

/// A reconcile gate that never reports clean — fail-closed default, as if
/// reconciliation has never run.
pub struct NeverClean;
impl ReconcileGate for NeverClean {
    fn is_clean(&self) -> bool {
        false
    }
}

/// A reconcile gate that always reports clean, for scenarios that care
/// about everything downstream of the gate rather than the gate itself.
pub struct AlwaysClean;
impl ReconcileGate for AlwaysClean {
    fn is_clean(&self) -> bool {
        true
    }
}

pub type PaperExecutionService = ExecutionService<PaperBuilder, PaperSigner, Arc<PaperChain>, Arc<PaperAlerts>>;

/// Shared scenario state: one temp runtime directory, one journal, one
/// paper chain/alerts pair, and one live-control mutex. "Restarting the
/// process" in a scenario is just calling [`Harness::service`] again —
/// the journal, chain, and control-state file all survive, exactly like a
/// real process restart against the same runtime directory would.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub journal: Arc<Journal>,
    pub chain: Arc<PaperChain>,
    pub alerts: Arc<PaperAlerts>,
    pub control_state_path: PathBuf,
    pub kill_switch: Arc<AtomicBool>,
    pub live_control: Arc<Mutex<LiveControlState>>,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp runtime dir");
        let journal = Arc::new(Journal::open(&dir.path().join("events.sqlite"), None).await);
        let control_state_path = dir.path().join("control_state.json");
        Self {
            chain: Arc::new(PaperChain::new()),
            alerts: Arc::new(PaperAlerts::new()),
            kill_switch: Arc::new(AtomicBool::new(false)),
            live_control: Arc::new(Mutex::new(LiveControlState::boot(None))),
            journal,
            control_state_path,
            dir,
        }
    }

    /// Reloads the live-control state from disk the way a fresh process
    /// boot would (fail-closed: anything but a persisted `Disarmed` resets
    /// to `Disarmed { BootDefault }`), and swaps it into this harness's
    /// shared mutex so a subsequently built service observes it.
    pub async fn reboot_live_control(&self) {
        let persisted = mqk_integrity::load_control_state(&self.control_state_path).expect("load control state");
        *self.live_control.lock().await = LiveControlState::boot(persisted);
    }

    /// Builds a fresh `ExecutionService` over this harness's shared
    /// journal/chain/alerts/control-state — the moving parts that survive
    /// a process restart.
    pub fn service(&self, config: ExecutionConfig, gate: Arc<dyn ReconcileGate>) -> PaperExecutionService {
        ExecutionService::new(
            self.journal.clone(),
            config,
            self.kill_switch.clone(),
            self.live_control.clone(),
            Some(self.control_state_path.clone()),
            gate,
            PaperBuilder,
            PaperSigner::new("wallet-under-test"),
            self.chain.clone(),
            self.alerts.clone(),
        )
    }
}
