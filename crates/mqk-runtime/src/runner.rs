//! Top-level orchestrator (§5): acquires the instance lock, wires the
//! intent bus to its four producers and its one consumer, and runs every
//! loop task until a shutdown signal arrives. Every task shares one
//! `watch<bool>` and checks it every iteration; shutdown joins all tasks
//! before returning, per the graceful-drain requirement.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use mqk_execution::ExecutionService;
use mqk_journal::Journal;
use mqk_position::{ExitThresholds, PositionManager};
use mqk_schemas::{ChainClient, FeeOracle, OperatorAlerts, OraclePriceFeed, TransactionBuilder, TxSigner};
use tokio::sync::Mutex;

use crate::consumer;
use crate::file_queue::FileQueueIngress;
use crate::heartbeat;
use crate::instance_lock::{default_lock_path, InstanceAlreadyRunning, InstanceLock};
use crate::intent_bus::{intent_bus, DEFAULT_QUEUE_CAPACITY};
use crate::position_monitor_task::{self, PositionMonitorConfig};
use crate::reconcile_task::{self, ReconcileGateHandle};

pub struct RunnerConfig {
    pub runtime_dir: PathBuf,
    pub queue_path: PathBuf,
    pub cursor_path: PathBuf,
    pub file_queue_poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub reconcile_interval: Duration,
    pub monitor_interval: Duration,
    pub borrow_recompute_interval: Duration,
    pub intent_bus_capacity: usize,
    pub thresholds: ExitThresholds,
    pub assumed_utilization: f64,
}

impl RunnerConfig {
    pub fn sane_defaults(runtime_dir: impl Into<PathBuf>) -> Self {
        let runtime_dir = runtime_dir.into();
        Self {
            queue_path: runtime_dir.join("intents.ndjson"),
            cursor_path: runtime_dir.join("intents.cursor"),
            runtime_dir,
            file_queue_poll_interval: Duration::from_millis(500),
            heartbeat_interval: heartbeat::DEFAULT_HEARTBEAT_INTERVAL,
            reconcile_interval: reconcile_task::DEFAULT_RECONCILE_INTERVAL,
            monitor_interval: position_monitor_task::DEFAULT_MONITOR_INTERVAL,
            borrow_recompute_interval: position_monitor_task::DEFAULT_BORROW_RECOMPUTE_INTERVAL,
            intent_bus_capacity: DEFAULT_QUEUE_CAPACITY,
            thresholds: ExitThresholds {
                take_profit_pct: 50.0,
                stop_loss_pct: 20.0,
                trailing_activation_pct: 30.0,
                trailing_drawdown_pct: 10.0,
                max_hold_hours: 48.0,
                max_borrow_pct_of_size: 5.0,
                liquidation_buffer_pct: 5.0,
            },
            assumed_utilization: 0.65,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub async fn run<Bld, Sig, Chn, Alr, Orc, Fee>(
    config: RunnerConfig,
    journal: Arc<Journal>,
    service: Arc<ExecutionService<Bld, Sig, Arc<Chn>, Arc<Alr>>>,
    chain: Arc<Chn>,
    alerts: Arc<Alr>,
    oracle: Arc<Orc>,
    fees: Arc<Fee>,
    gate: Arc<ReconcileGateHandle>,
    kill_switch: Arc<AtomicBool>,
) -> Result<(), InstanceAlreadyRunning>
where
    Bld: TransactionBuilder + Send + Sync + 'static,
    Sig: TxSigner + Send + Sync + 'static,
    Chn: ChainClient + Send + Sync + 'static,
    Alr: OperatorAlerts + Send + Sync + 'static,
    Orc: OraclePriceFeed + Send + Sync + 'static,
    Fee: FeeOracle + Send + Sync + 'static,
{
    let lock = InstanceLock::acquire(default_lock_path(&config.runtime_dir))?;
    tracing::info!("startup");

    let positions = Arc::new(Mutex::new(PositionManager::new()));
    let (producer, consumer_half) = intent_bus(config.intent_bus_capacity);
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let file_queue = FileQueueIngress::new(config.queue_path.clone(), config.cursor_path.clone(), producer.clone());
    let file_queue_handle = tokio::spawn(file_queue.run(shutdown_rx.clone(), config.file_queue_poll_interval));

    let heartbeat_handle = tokio::spawn(heartbeat::run(producer.clone(), positions.clone(), config.heartbeat_interval, shutdown_rx.clone()));

    let reconcile_handle = tokio::spawn(reconcile_task::run(
        chain.clone(),
        alerts.clone(),
        journal.clone(),
        positions.clone(),
        gate,
        config.reconcile_interval,
        shutdown_rx.clone(),
    ));

    let monitor_config = PositionMonitorConfig { thresholds: config.thresholds, assumed_utilization: config.assumed_utilization };
    let monitor_handle = tokio::spawn(position_monitor_task::run(
        positions.clone(),
        oracle.clone(),
        fees.clone(),
        producer.clone(),
        monitor_config,
        config.monitor_interval,
        config.borrow_recompute_interval,
        kill_switch.clone(),
        shutdown_rx.clone(),
    ));

    let consumer_handle = tokio::spawn(consumer::run(consumer_half, service, positions, shutdown_rx.clone()));

    wait_for_shutdown_signal().await;
    tracing::info!("runner_shutdown_signal_received");
    let _ = shutdown_tx.send(true);

    let (fq, hb, rc, mon, cons) = tokio::join!(file_queue_handle, heartbeat_handle, reconcile_handle, monitor_handle, consumer_handle);
    for (task, result) in [("file_queue", fq), ("heartbeat", hb), ("reconcile", rc), ("position_monitor", mon), ("consumer", cons)] {
        if let Err(err) = result {
            tracing::error!(task, error = %err, "task_crash");
        }
    }
    drop(lock);
    tracing::info!("shutdown");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
