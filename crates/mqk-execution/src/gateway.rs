//! Reconcile-freshness gate contract.
//!
//! The execution service refuses to submit a LIVE transaction unless the
//! most recent reconciliation pass was both clean and recent. This trait is
//! the seam [`crate::reconcile_guard::ReconcileFreshnessGuard`] implements;
//! the service holds a `dyn ReconcileGate` rather than depending on the
//! concrete guard type, so tests can substitute a trivial stub.

pub trait ReconcileGate: Send + Sync {
    fn is_clean(&self) -> bool;
}
