use mqk_reconcile::{reconcile, Classification, LocalPositionView, LocalSnapshot};
use mqk_schemas::{ChainPosition, ChainSnapshot, Side};
use std::collections::BTreeMap;

#[test]
fn classifies_all_three_drift_kinds_in_one_pass() {
    let mut positions = BTreeMap::new();
    positions.insert(
        "mismatched".to_string(),
        LocalPositionView {
            idempotency_key: "mismatched".into(),
            pda: Some("pda-a".into()),
            side: Side::Long,
            size_usd: 1000.0,
        },
    );
    positions.insert(
        "zombie".to_string(),
        LocalPositionView {
            idempotency_key: "zombie".into(),
            pda: Some("pda-b".into()),
            side: Side::Short,
            size_usd: 500.0,
        },
    );
    let local = LocalSnapshot { positions };

    let chain = ChainSnapshot {
        positions: vec![
            ChainPosition { pda: "pda-a".into(), owner: "w".into(), side: Side::Long, size_usd: 1800.0 },
            ChainPosition { pda: "pda-c".into(), owner: "w".into(), side: Side::Long, size_usd: 250.0 },
        ],
        requests: vec![],
    };

    let report = reconcile(&local, &chain);
    assert_eq!(report.classifications.len(), 3);
    assert!(report.classifications.iter().any(|c| matches!(c, Classification::Mismatch { idempotency_key, .. } if idempotency_key == "mismatched")));
    assert!(report.classifications.iter().any(|c| matches!(c, Classification::Zombie { idempotency_key, .. } if idempotency_key == "zombie")));
    assert!(report.classifications.iter().any(|c| matches!(c, Classification::Ghost { pda, .. } if pda == "pda-c")));
}

#[test]
fn pda_enumeration_covers_every_market_mint_side_slot_combination() {
    use mqk_schemas::{CollateralMint, Market};
    let markets = [Market::SolUsd, Market::BtcUsd];
    let mints = [CollateralMint::Usdc];
    let pdas = mqk_reconcile::enumerate_candidate_pdas(&markets, &mints);
    // 2 markets * 1 mint * 2 sides * 9 slots
    assert_eq!(pdas.len(), 2 * 1 * 2 * 9);
}
