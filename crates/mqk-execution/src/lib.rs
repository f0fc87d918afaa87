//! Execution service (§4.2): admits an `ExecutionIntent`, runs it through
//! the risk gate and (in live mode) the live-control gate, journals it
//! exactly once, and — outside dry-run — builds, signs, submits, and
//! confirms the on-chain transaction via injected collaborators.

mod daily_counters;
mod gateway;
mod intent;
mod reconcile_guard;
mod service;

pub use gateway::ReconcileGate;
pub use intent::{CancelRequest, ClosePosition, CreateTpsl, ExecutionIntent, InvalidIntent, Noop, OpenPosition, ReducePosition};
pub use reconcile_guard::ReconcileFreshnessGuard;
pub use service::{ExecutionConfig, ExecutionError, ExecutionOutcome, ExecutionService};
