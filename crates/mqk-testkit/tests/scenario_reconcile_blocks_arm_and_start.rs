//! Every LIVE arm confirmation and every periodic reconcile tick must pass
//! through the same clean/dirty classification (§4.7): a clean chain view
//! permits, any GHOST/MISMATCH/ZOMBIE drift blocks.

use mqk_reconcile::{check_arm_gate, reconcile_tick, DriftAction, LocalPositionView, LocalSnapshot};
use mqk_schemas::{ChainPosition, ChainSnapshot, Side};

fn local_with(key: &str, pda: &str, side: Side, size_usd: f64) -> LocalSnapshot {
    let mut snapshot = LocalSnapshot::empty();
    snapshot.positions.insert(key.to_string(), LocalPositionView { idempotency_key: key.to_string(), pda: Some(pda.to_string()), side, size_usd });
    snapshot
}

fn chain_with(pda: &str, side: Side, size_usd: f64) -> ChainSnapshot {
    ChainSnapshot { positions: vec![ChainPosition { pda: pda.to_string(), owner: "wallet".to_string(), side, size_usd }], requests: vec![] }
}

#[test]
fn matching_local_and_chain_positions_permit_the_arm_gate() {
    let local = local_with("key-1", "pda-1", Side::Long, 500.0);
    let chain = chain_with("pda-1", Side::Long, 500.0);

    assert!(check_arm_gate(&local, &chain).is_permitted());
    assert_eq!(reconcile_tick(&local, &chain), DriftAction::Continue);
}

#[test]
fn a_chain_position_the_local_view_has_never_heard_of_blocks_both_gates() {
    let local = LocalSnapshot::empty();
    let chain = chain_with("ghost-pda", Side::Long, 100.0);

    let gate = check_arm_gate(&local, &chain);
    assert!(!gate.is_permitted(), "a ghost chain position must block the arm gate");

    let tick = reconcile_tick(&local, &chain);
    assert!(tick.requires_halt_and_disarm(), "a ghost chain position must halt and disarm on the periodic tick");
}

#[test]
fn a_size_mismatch_beyond_tolerance_blocks_both_gates() {
    let local = local_with("key-2", "pda-2", Side::Short, 1000.0);
    let chain = chain_with("pda-2", Side::Short, 1500.0);

    assert!(!check_arm_gate(&local, &chain).is_permitted());
    assert!(reconcile_tick(&local, &chain).requires_halt_and_disarm());
}

#[test]
fn a_locally_tracked_position_missing_on_chain_blocks_both_gates() {
    let local = local_with("key-3", "pda-3", Side::Long, 200.0);
    let chain = ChainSnapshot { positions: vec![], requests: vec![] };

    assert!(!check_arm_gate(&local, &chain).is_permitted(), "a zombie position must block the arm gate");
    assert!(reconcile_tick(&local, &chain).requires_halt_and_disarm());
}

#[test]
fn resolving_the_drift_restores_both_gates() {
    let local = local_with("key-4", "pda-4", Side::Long, 300.0);

    let dirty_chain = chain_with("pda-4", Side::Long, 9000.0);
    assert!(!check_arm_gate(&local, &dirty_chain).is_permitted());

    let clean_chain = chain_with("pda-4", Side::Long, 300.0);
    assert!(check_arm_gate(&local, &clean_chain).is_permitted());
    assert_eq!(reconcile_tick(&local, &clean_chain), DriftAction::Continue);
}

#[test]
fn a_blocked_arm_gate_carries_the_classification_evidence() {
    let local = LocalSnapshot::empty();
    let chain = chain_with("ghost-pda", Side::Short, 400.0);

    match check_arm_gate(&local, &chain) {
        mqk_reconcile::ArmStartGate::Blocked { report } => {
            assert!(!report.classifications.is_empty(), "a blocked gate must carry at least one classification");
        }
        mqk_reconcile::ArmStartGate::Permitted => panic!("expected Blocked"),
    }
}
