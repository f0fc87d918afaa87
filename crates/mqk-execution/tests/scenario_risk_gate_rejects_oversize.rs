//! The risk gate's static size/leverage bounds are enforced before the
//! journal insert, never after: a rejected intent still lands in the
//! journal as failed (for auditability) but never reaches a collaborator.

mod support;

use mqk_execution::{ExecutionError, ExecutionIntent};
use mqk_schemas::{CollateralMint, Market, Side};
use support::service_with_defaults;

#[tokio::test]
async fn oversized_position_is_rejected_before_submission() {
    let harness = service_with_defaults(false, false).await;

    // sane_defaults risk config caps position size at $5,000; 1000 * 10 = $10,000.
    let intent = ExecutionIntent::open_position(Market::BtcUsd, Side::Long, CollateralMint::Usdc, 1_000.0, 10, 50).unwrap();

    let result = harness.service.execute(&intent, 0).await;

    assert!(matches!(result, Err(ExecutionError::RiskGateRejected(_))));
    assert_eq!(harness.chain.submit_count(), 0);
}

#[tokio::test]
async fn too_many_open_positions_is_rejected() {
    let harness = service_with_defaults(false, false).await;

    let intent = ExecutionIntent::open_position(Market::SolUsd, Side::Long, CollateralMint::Usdc, 100.0, 2, 50).unwrap();

    // sane_defaults caps open positions at 5.
    let result = harness.service.execute(&intent, 5).await;

    assert!(matches!(result, Err(ExecutionError::RiskGateRejected(_))));
}
