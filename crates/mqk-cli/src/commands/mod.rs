//! Command handler modules for mqk-cli.
//!
//! Shared filesystem-layout helpers (§6.2) used by more than one subcommand
//! live here; command-specific logic lives in the submodules.

pub mod control;
pub mod run;

use std::path::{Path, PathBuf};

pub fn control_state_path(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join("control_state.json")
}

pub fn control_audit_log_path(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join("control_audit.log")
}

/// Every CLI invocation is its own short-lived "run" for audit-correlation
/// purposes — there is no persisted run registry in this core, so the audit
/// trail groups by process rather than by a long-lived run row.
pub fn new_invocation_id() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}
