//! Runtime orchestration (§4.1, §4.7, §4.8, §5): the single-process,
//! single-threaded cooperative scheduler that ties the execution service,
//! position manager, and reconciliation loop together into one runnable
//! agent. Dry-run/paper mode (backed by `mqk-chain-paper`) is a first-class
//! production mode, not merely a test harness — LIVE mode supplies its own
//! real collaborator implementations from outside this crate.

pub mod consumer;
pub mod file_queue;
pub mod heartbeat;
pub mod instance_lock;
pub mod intent_bus;
pub mod position_monitor_task;
pub mod reconcile_task;
pub mod runner;

pub use file_queue::FileQueueIngress;
pub use instance_lock::{default_lock_path, InstanceAlreadyRunning, InstanceLock};
pub use intent_bus::{intent_bus, IntentConsumer, IntentProducer, QueueBackpressure, DEFAULT_QUEUE_CAPACITY};
pub use position_monitor_task::{PositionMonitorConfig, DEFAULT_BORROW_RECOMPUTE_INTERVAL, DEFAULT_MONITOR_INTERVAL};
pub use reconcile_task::{ReconcileGateHandle, DEFAULT_RECONCILE_INTERVAL};
pub use runner::RunnerConfig;
