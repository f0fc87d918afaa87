//! Execution service (§4.2): the seven-step pipeline every intent flows
//! through, in order. This is the only place that calls the signer, the
//! chain client, and the journal's write path — mirroring the teacher's
//! "single choke-point gateway" shape, generalized from a stock broker
//! adapter to a transaction builder + signer + chain client trio.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use mqk_integrity::LiveControlState;
use mqk_journal::{IntentOutcome, Journal};
use mqk_risk::{evaluate as risk_evaluate, RiskAction, RiskConfig, RiskInput};
use mqk_schemas::{ChainClient, OperatorAlerts, TransactionBuilder, TxSigner, TxStatus};
use tokio::sync::Mutex;

use crate::daily_counters::DailyCounters;
use crate::gateway::ReconcileGate;
use crate::intent::ExecutionIntent;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Acknowledged,
    SkippedDuplicate,
    Simulated,
    Confirmed { tx_signature: String, slot: i64, block_time: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    RiskGateRejected(String),
    LiveGateRejected(String),
    ReconcileNotClean,
    SubmitTimeout,
    SubmitFailed(String),
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionError::RiskGateRejected(r) => write!(f, "risk_gate:{r}"),
            ExecutionError::LiveGateRejected(r) => write!(f, "live_control:{r}"),
            ExecutionError::ReconcileNotClean => write!(f, "live_control:reconcile_not_clean"),
            ExecutionError::SubmitTimeout => write!(f, "SubmitTimeout"),
            ExecutionError::SubmitFailed(r) => write!(f, "submit_failed:{r}"),
        }
    }
}

impl std::error::Error for ExecutionError {}

const MAX_ERROR_MSG_LEN: usize = 512;

pub struct ExecutionConfig {
    pub dry_run: bool,
    pub live_mode: bool,
    pub risk: RiskConfig,
    pub max_trades_per_day: u32,
    pub daily_loss_limit_usd: f64,
    pub confirm_timeout: Duration,
    pub confirm_poll_interval: Duration,
}

impl ExecutionConfig {
    pub fn sane_defaults() -> Self {
        Self {
            dry_run: true,
            live_mode: false,
            risk: RiskConfig::sane_defaults(),
            max_trades_per_day: 20,
            daily_loss_limit_usd: 1_000.0,
            confirm_timeout: Duration::from_secs(60),
            confirm_poll_interval: Duration::from_secs(1),
        }
    }
}

pub struct ExecutionService<Bld, Sig, Chn, Alr> {
    journal: Arc<Journal>,
    config: ExecutionConfig,
    kill_switch: Arc<AtomicBool>,
    live_control: Arc<Mutex<LiveControlState>>,
    control_state_path: Option<PathBuf>,
    daily: Arc<Mutex<DailyCounters>>,
    reconcile_gate: Arc<dyn ReconcileGate>,
    builder: Bld,
    signer: Sig,
    chain: Chn,
    alerts: Alr,
}

impl<Bld, Sig, Chn, Alr> ExecutionService<Bld, Sig, Chn, Alr>
where
    Bld: TransactionBuilder,
    Sig: TxSigner,
    Chn: ChainClient,
    Alr: OperatorAlerts,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        journal: Arc<Journal>,
        config: ExecutionConfig,
        kill_switch: Arc<AtomicBool>,
        live_control: Arc<Mutex<LiveControlState>>,
        control_state_path: Option<PathBuf>,
        reconcile_gate: Arc<dyn ReconcileGate>,
        builder: Bld,
        signer: Sig,
        chain: Chn,
        alerts: Alr,
    ) -> Self {
        Self {
            journal,
            daily: Arc::new(Mutex::new(DailyCounters::new(Utc::now()))),
            config,
            kill_switch,
            live_control,
            control_state_path,
            reconcile_gate,
            builder,
            signer,
            chain,
            alerts,
        }
    }

    /// Runs one intent through the full pipeline. `open_position_count` is
    /// supplied by the caller (the position manager) on every call — this
    /// service intentionally owns no position state of its own.
    pub async fn execute(&self, intent: &ExecutionIntent, open_position_count: usize) -> Result<ExecutionOutcome, ExecutionError> {
        // Step 1: type admission. Every `ExecutionIntent` the bus carries is
        // already one of the six allowed variants by construction; raw
        // records naming an unknown kind are refused at bus ingestion
        // (mqk-runtime), not re-checked here. `Noop` is pure liveness.
        if let ExecutionIntent::Noop(_) = intent {
            return Ok(ExecutionOutcome::Acknowledged);
        }

        // Step 2: risk gate.
        if let Err(reason) = self.check_risk_gate(intent, open_position_count) {
            self.journal_rejected(intent, &format!("risk_gate:{reason}")).await;
            return Err(ExecutionError::RiskGateRejected(reason));
        }

        // Step 3: live-mode gate (OpenPosition only, live mode only).
        if self.config.live_mode {
            if let ExecutionIntent::OpenPosition(_) = intent {
                if let Err(reason) = self.check_live_gate().await {
                    self.journal_rejected(intent, &format!("live_control:{reason}")).await;
                    self.alerts.send_alert(&format!("LIVE arm auto-disarmed: {reason}")).await;
                    return Err(ExecutionError::LiveGateRejected(reason));
                }
            }
        }

        // Step 4: journal insert, conditional on a new idempotency key.
        let key = intent.idempotency_key().to_string();
        let is_new = self
            .journal
            .log_intent_pending(&key, intent.kind(), &intent.to_json())
            .await
            .map_err(|e| ExecutionError::SubmitFailed(truncate(&e.to_string())))?;

        if !is_new {
            let _ = self.journal.mark_skipped(&key).await;
            let _ = self.journal.record_idempotency(&key, IntentOutcome::SkippedDuplicate).await;
            return Ok(ExecutionOutcome::SkippedDuplicate);
        }

        // Step 5: dry-run path.
        if self.config.dry_run {
            let _ = self.journal.mark_simulated(&key).await;
            let _ = self.journal.record_idempotency(&key, IntentOutcome::Simulated).await;
            return Ok(ExecutionOutcome::Simulated);
        }

        // Step 6: live path.
        match self.submit_live(intent, &key).await {
            Ok(outcome) => {
                if matches!(intent, ExecutionIntent::OpenPosition(_)) {
                    self.daily.lock().await.record_trade(Utc::now());
                }
                let _ = self.journal.record_idempotency(&key, IntentOutcome::Executed).await;
                Ok(outcome)
            }
            Err(err) => {
                // Step 7: any exception after journal insert marks failed;
                // the idempotency record remains so retries are skipped.
                let _ = self.journal.mark_failed(&key, &truncate(&err.to_string())).await;
                let _ = self.journal.record_idempotency(&key, IntentOutcome::Failed).await;
                Err(err)
            }
        }
    }

    fn check_risk_gate(&self, intent: &ExecutionIntent, open_position_count: usize) -> Result<(), String> {
        let kill_switch_active = self.kill_switch.load(Ordering::SeqCst);
        if kill_switch_active {
            return Err("kill_switch_active".to_string());
        }
        if let ExecutionIntent::OpenPosition(op) = intent {
            let input = RiskInput {
                leverage: op.leverage,
                size_usd: op.size_usd,
                open_position_count,
                kill_switch_active,
                daily_loss_limit_breached: self.daily.try_lock().map(|d| d.daily_loss_limit_breached(Utc::now(), self.config.daily_loss_limit_usd)).unwrap_or(false),
            };
            let decision = risk_evaluate(&self.config.risk, &input);
            if decision.action == RiskAction::Reject {
                return Err(decision.reason.as_str().to_string());
            }
        }
        Ok(())
    }

    async fn check_live_gate(&self) -> Result<(), String> {
        if !self.reconcile_gate.is_clean() {
            return Err("reconcile_not_clean".to_string());
        }

        let mut live_control = self.live_control.lock().await;
        if !live_control.is_armed() {
            return Err("not_armed".to_string());
        }

        let now = Utc::now();
        let daily = self.daily.lock().await;
        let trades_exceeded = daily.max_trades_exceeded(now, self.config.max_trades_per_day);
        let loss_breached = daily.daily_loss_limit_breached(now, self.config.daily_loss_limit_usd);
        drop(daily);

        if trades_exceeded || loss_breached {
            if let Some(disarmed) = mqk_integrity::check_daily_guardrail(&live_control, loss_breached || trades_exceeded) {
                *live_control = disarmed;
                if let Some(path) = &self.control_state_path {
                    let _ = mqk_integrity::save_control_state(path, &live_control);
                }
            }
            let reason = if loss_breached { "daily_loss_limit_breached" } else { "max_trades_per_day_exceeded" };
            return Err(reason.to_string());
        }

        Ok(())
    }

    async fn submit_live(&self, intent: &ExecutionIntent, key: &str) -> Result<ExecutionOutcome, ExecutionError> {
        let wallet_addr = self.signer.wallet_address();
        let unsigned = self
            .builder
            .build(&intent.to_json(), &wallet_addr)
            .map_err(|e| ExecutionError::SubmitFailed(e.to_string()))?;
        let signed = self.signer.sign(&unsigned).map_err(|e| ExecutionError::SubmitFailed(e.to_string()))?;
        let signature = self.chain.send_raw_transaction(&signed).await.map_err(|e| ExecutionError::SubmitFailed(e.to_string()))?;

        let _ = self.journal.mark_submitted(key, &signature).await;

        let deadline = tokio::time::Instant::now() + self.config.confirm_timeout;
        loop {
            match self.chain.get_signature_status(&signature).await {
                Ok(Some(TxStatus::Confirmed { slot, block_time })) => {
                    let _ = self.journal.mark_confirmed(key, &signature, slot as i64, block_time).await;
                    return Ok(ExecutionOutcome::Confirmed { tx_signature: signature, slot: slot as i64, block_time });
                }
                Ok(Some(TxStatus::Failed { reason })) => {
                    return Err(ExecutionError::SubmitFailed(reason));
                }
                Ok(None) => {}
                Err(e) => return Err(ExecutionError::SubmitFailed(e.to_string())),
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(ExecutionError::SubmitTimeout);
            }
            tokio::time::sleep(self.config.confirm_poll_interval).await;
        }
    }

    async fn journal_rejected(&self, intent: &ExecutionIntent, reason: &str) {
        let key = intent.idempotency_key().to_string();
        if self.journal.log_intent_pending(&key, intent.kind(), &intent.to_json()).await.unwrap_or(false) {
            let _ = self.journal.mark_failed(&key, reason).await;
            let _ = self.journal.record_idempotency(&key, IntentOutcome::Failed).await;
        }
    }
}

fn truncate(s: &str) -> String {
    s.chars().take(MAX_ERROR_MSG_LEN).collect()
}
