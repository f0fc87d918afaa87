//! Reconcile gate: mandatory check surfaces built on top of [`crate::engine::reconcile`].
//!
//! 1. **Arm/start gate** — every LIVE arm confirmation MUST pass through
//!    [`check_arm_gate`]. Blocks on any non-clean reconcile.
//! 2. **Periodic drift tick** — [`reconcile_tick`] runs on every
//!    reconciliation interval; [`DriftAction::HaltAndDisarm`] means the
//!    runtime must stop submitting new intents and persist a disarm record.

use crate::engine::reconcile;
use crate::types::{LocalSnapshot, ReconcileReport};
use mqk_schemas::ChainSnapshot;

#[derive(Clone, Debug, PartialEq)]
pub enum ArmStartGate {
    Permitted,
    Blocked { report: ReconcileReport },
}

impl ArmStartGate {
    pub fn is_permitted(&self) -> bool {
        matches!(self, ArmStartGate::Permitted)
    }
}

/// Gate check for LIVE arm confirmation — reconcile MUST be clean.
pub fn check_arm_gate(local: &LocalSnapshot, chain: &ChainSnapshot) -> ArmStartGate {
    let report = reconcile(local, chain);
    if report.is_clean() {
        ArmStartGate::Permitted
    } else {
        tracing::warn!(drift_count = report.classifications.len(), "reconcile drift blocks live arm");
        ArmStartGate::Blocked { report }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DriftAction {
    Continue,
    HaltAndDisarm { report: ReconcileReport },
}

impl DriftAction {
    pub fn requires_halt_and_disarm(&self) -> bool {
        matches!(self, DriftAction::HaltAndDisarm { .. })
    }
}

/// Periodic reconcile tick — stateless, same inputs always produce the same
/// output.
pub fn reconcile_tick(local: &LocalSnapshot, chain: &ChainSnapshot) -> DriftAction {
    let report = reconcile(local, chain);
    if report.is_clean() {
        DriftAction::Continue
    } else {
        tracing::error!(drift_count = report.classifications.len(), "reconcile drift detected, halting and disarming");
        DriftAction::HaltAndDisarm { report }
    }
}
