use mqk_reconcile::{check_arm_gate, reconcile_tick, ArmStartGate, DriftAction, LocalPositionView, LocalSnapshot};
use mqk_schemas::{ChainPosition, ChainSnapshot, Side};
use std::collections::BTreeMap;

fn clean_pair() -> (LocalSnapshot, ChainSnapshot) {
    let mut positions = BTreeMap::new();
    positions.insert(
        "k1".to_string(),
        LocalPositionView { idempotency_key: "k1".into(), pda: Some("pda1".into()), side: Side::Long, size_usd: 1000.0 },
    );
    let local = LocalSnapshot { positions };
    let chain = ChainSnapshot {
        positions: vec![ChainPosition { pda: "pda1".into(), owner: "w".into(), side: Side::Long, size_usd: 1000.0 }],
        requests: vec![],
    };
    (local, chain)
}

#[test]
fn clean_reconcile_permits_arm() {
    let (local, chain) = clean_pair();
    assert_eq!(check_arm_gate(&local, &chain), ArmStartGate::Permitted);
}

#[test]
fn ghost_position_blocks_arm() {
    let (local, _) = clean_pair();
    let chain_with_ghost = ChainSnapshot {
        positions: vec![ChainPosition { pda: "unexpected".into(), owner: "w".into(), side: Side::Short, size_usd: 200.0 }],
        requests: vec![],
    };
    let gate = check_arm_gate(&local, &chain_with_ghost);
    assert!(!gate.is_permitted());
    match gate {
        ArmStartGate::Blocked { report } => assert!(!report.is_clean()),
        ArmStartGate::Permitted => panic!("expected blocked"),
    }
}

#[test]
fn drift_on_periodic_tick_forces_halt_and_disarm() {
    let (local, _) = clean_pair();
    let chain_empty = ChainSnapshot { positions: vec![], requests: vec![] };
    let action = reconcile_tick(&local, &chain_empty);
    assert!(action.requires_halt_and_disarm());
    assert!(matches!(action, DriftAction::HaltAndDisarm { .. }));
}

#[test]
fn no_drift_on_periodic_tick_continues() {
    let (local, chain) = clean_pair();
    assert_eq!(reconcile_tick(&local, &chain), DriftAction::Continue);
}
