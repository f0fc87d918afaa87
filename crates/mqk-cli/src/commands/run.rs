//! `mqk run` — boots the single-process runner (§5) wired to the reference
//! paper/dry-run collaborators from `mqk-chain-paper`. A real chain client,
//! transaction builder, signer, and RPC endpoint are collaborator contracts
//! this core deliberately treats as out of scope (§1) — a LIVE deployment
//! links its own implementations of those traits into an equivalent binary.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use mqk_chain_paper::{PaperAlerts, PaperBuilder, PaperChain, PaperFees, PaperOracle, PaperSigner};
use mqk_execution::ExecutionConfig;
use mqk_integrity::{load_control_state, verify_startup_integrity, LiveControlState};
use mqk_journal::Journal;
use mqk_runtime::{runner, ReconcileGateHandle, RunnerConfig};
use serde_json::Value;
use tokio::sync::Mutex;

use super::control_state_path;

#[derive(Args, Debug)]
pub struct StartArgs {
    #[arg(long, default_value = ".")]
    pub runtime_dir: String,

    /// BACKTEST | DRY_RUN | LIVE (case-insensitive).
    #[arg(long, default_value = "DRY_RUN")]
    pub mode: String,

    /// Layered config YAML paths, merge order base -> override.
    #[arg(long = "config", required = true)]
    pub config_paths: Vec<String>,

    /// Overrides `/integrity/idl_path` from config.
    #[arg(long)]
    pub idl_path: Option<String>,

    /// Overrides `/integrity/idl_sha256` from config.
    #[arg(long)]
    pub idl_sha256: Option<String>,

    #[arg(long)]
    pub reconcile_interval_secs: Option<u64>,
    #[arg(long)]
    pub heartbeat_interval_secs: Option<u64>,
    #[arg(long)]
    pub queue_size: Option<usize>,
    #[arg(long)]
    pub rpc_url: Option<String>,
    #[arg(long)]
    pub wallet_address: Option<String>,
}

pub async fn run_start(args: StartArgs) -> Result<()> {
    let runtime_dir = PathBuf::from(&args.runtime_dir);
    std::fs::create_dir_all(&runtime_dir).with_context(|| format!("create runtime dir {:?}", runtime_dir))?;

    let path_refs: Vec<&str> = args.config_paths.iter().map(String::as_str).collect();
    let loaded = mqk_config::load_layered_yaml(&path_refs)?;
    tracing::info!(config_hash = %loaded.config_hash, "config_loaded");

    let mode = args.mode.trim().to_ascii_uppercase();
    let secrets = mqk_config::secrets::resolve_secrets_for_mode(&loaded.config_json, &mode)?;

    run_startup_integrity_check(&loaded.config_json, &args)?;

    let rpc_url = args.rpc_url.or(secrets.rpc_url).unwrap_or_default();
    let wallet_address = args.wallet_address.or(secrets.wallet_address).unwrap_or_default();
    tracing::info!(mode = %mode, rpc_url_set = !rpc_url.is_empty(), wallet_set = !wallet_address.is_empty(), "run_start");

    let journal_path = runtime_dir.join("events.sqlite");
    let journal = Arc::new(Journal::open(&journal_path, secrets.operator_alert_webhook.as_deref()).await);

    let persisted = load_control_state(control_state_path(&runtime_dir)).context("load control state")?;
    let live_control = Arc::new(Mutex::new(LiveControlState::boot(persisted)));
    let kill_switch = Arc::new(AtomicBool::new(false));

    let freshness_bound_ms = loaded.config_json.pointer("/reconcile/freshness_bound_ms").and_then(Value::as_i64).unwrap_or(30_000);
    let gate = Arc::new(ReconcileGateHandle::new(freshness_bound_ms));

    let exec_config = build_execution_config(&loaded.config_json, &mode);

    let chain = Arc::new(PaperChain::new());
    let alerts = Arc::new(PaperAlerts::new());
    let oracle = Arc::new(PaperOracle::new());
    let fees = Arc::new(PaperFees::sane_defaults());

    let service = Arc::new(mqk_execution::ExecutionService::new(
        journal.clone(),
        exec_config,
        kill_switch.clone(),
        live_control,
        Some(control_state_path(&runtime_dir)),
        gate.clone(),
        PaperBuilder,
        PaperSigner::new(wallet_address),
        chain.clone(),
        alerts.clone(),
    ));

    let mut runner_config = RunnerConfig::sane_defaults(&runtime_dir);
    if let Some(secs) = args.reconcile_interval_secs {
        runner_config.reconcile_interval = Duration::from_secs(secs);
    }
    if let Some(secs) = args.heartbeat_interval_secs {
        runner_config.heartbeat_interval = Duration::from_secs(secs);
    }
    if let Some(capacity) = args.queue_size {
        runner_config.intent_bus_capacity = capacity;
    }

    runner::run(runner_config, journal, service, chain, alerts, oracle, fees, gate, kill_switch)
        .await
        .context("runner exited")?;

    Ok(())
}

fn run_startup_integrity_check(config_json: &Value, args: &StartArgs) -> Result<()> {
    let idl_path = args
        .idl_path
        .clone()
        .or_else(|| config_json.pointer("/integrity/idl_path").and_then(Value::as_str).map(str::to_string));
    let idl_sha256 = args
        .idl_sha256
        .clone()
        .or_else(|| config_json.pointer("/integrity/idl_sha256").and_then(Value::as_str).map(str::to_string));

    match (idl_path, idl_sha256) {
        (Some(path), Some(expected)) => {
            verify_startup_integrity(&path, &expected).context("INTEGRITY_CHECK_FAILED")?;
            tracing::info!(idl_path = %path, "startup_integrity_check_passed");
            Ok(())
        }
        (None, None) => {
            tracing::warn!("startup_integrity_check_skipped: no idl_path/idl_sha256 configured");
            Ok(())
        }
        _ => anyhow::bail!("both /integrity/idl_path and /integrity/idl_sha256 (or both --idl-path and --idl-sha256) must be set together"),
    }
}

fn build_execution_config(config_json: &Value, mode: &str) -> ExecutionConfig {
    let mut config = ExecutionConfig::sane_defaults();
    config.dry_run = mode != "LIVE";
    config.live_mode = mode == "LIVE";

    if let Some(v) = config_json.pointer("/risk/max_leverage").and_then(Value::as_u64) {
        config.risk.max_leverage = v as u32;
    }
    if let Some(v) = config_json.pointer("/risk/max_position_size_usd").and_then(Value::as_f64) {
        config.risk.max_position_size_usd = v;
    }
    if let Some(v) = config_json.pointer("/risk/max_open_positions").and_then(Value::as_u64) {
        config.risk.max_open_positions = v as usize;
    }
    if let Some(v) = config_json.pointer("/risk/daily_loss_limit_usd").and_then(Value::as_f64) {
        config.risk.daily_loss_limit_usd = v;
        config.daily_loss_limit_usd = v;
    }
    if let Some(v) = config_json.pointer("/execution/max_trades_per_day").and_then(Value::as_u64) {
        config.max_trades_per_day = v as u32;
    }
    config
}

pub fn run_status(runtime_dir: &str) -> Result<()> {
    let runtime_dir = Path::new(runtime_dir);
    let lock_path = mqk_runtime::default_lock_path(runtime_dir);
    println!("runtime_dir={}", runtime_dir.display());
    println!("instance_lock_held={}", lock_path.exists());

    match load_control_state(control_state_path(runtime_dir))? {
        Some(state) => println!("control_state={state:?}"),
        None => println!("control_state=unset (boots Disarmed)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_execution_config_live_mode_disables_dry_run() {
        let config_json = serde_json::json!({});
        let config = build_execution_config(&config_json, "LIVE");
        assert!(!config.dry_run);
        assert!(config.live_mode);
    }

    #[test]
    fn build_execution_config_reads_risk_overrides() {
        let config_json = serde_json::json!({"risk": {"max_leverage": 25, "daily_loss_limit_usd": 250.0}});
        let config = build_execution_config(&config_json, "DRY_RUN");
        assert_eq!(config.risk.max_leverage, 25);
        assert_eq!(config.daily_loss_limit_usd, 250.0);
    }

    #[test]
    fn run_status_on_an_empty_dir_reports_no_lock_and_unset_control_state() {
        let dir = tempfile::tempdir().unwrap();
        run_status(dir.path().to_str().unwrap()).unwrap();
    }
}
