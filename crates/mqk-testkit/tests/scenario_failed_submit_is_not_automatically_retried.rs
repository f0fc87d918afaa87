//! A submit failure after the journal insert marks the intent `Failed`, but
//! the idempotency record stays put — the same intent delivered again must
//! come back `SkippedDuplicate`, never resubmitted, even though the chain
//! never actually confirmed it the first time (§4.2 step 7).

use std::sync::Arc;

use mqk_execution::{ExecutionConfig, ExecutionError, ExecutionIntent, ExecutionOutcome};
use mqk_schemas::{CollateralMint, Market, Side};
use mqk_testkit::{AlwaysClean, Harness};

#[tokio::test]
async fn a_failed_submit_is_journaled_failed_and_never_auto_retried() {
    let harness = Harness::new().await;
    let mut config = ExecutionConfig::sane_defaults();
    config.dry_run = false;
    let service = harness.service(config, Arc::new(AlwaysClean));

    let intent = ExecutionIntent::open_position(Market::SolUsd, Side::Long, CollateralMint::Usdc, 250.0, 4, 50).unwrap();

    harness.chain.fail_next_submit("paper-simulated-rpc-outage");
    let first = service.execute(&intent, 0).await.unwrap_err();
    assert!(matches!(first, ExecutionError::SubmitFailed(_)));
    assert_eq!(harness.chain.submit_count(), 0, "a failed submit must not count as a successful submission");

    // No fail_next_submit armed this time — if the service retried on its
    // own it would now succeed. It must not: the idempotency key was
    // already recorded against this intent on the failed attempt.
    let replay = service.execute(&intent, 0).await.unwrap();
    assert_eq!(replay, ExecutionOutcome::SkippedDuplicate, "a failed intent must never be auto-retried");
    assert_eq!(harness.chain.submit_count(), 0);
}

#[tokio::test]
async fn a_distinct_intent_after_a_failed_submit_is_unaffected() {
    let harness = Harness::new().await;
    let mut config = ExecutionConfig::sane_defaults();
    config.dry_run = false;
    let service = harness.service(config, Arc::new(AlwaysClean));

    let failing = ExecutionIntent::open_position(Market::SolUsd, Side::Long, CollateralMint::Usdc, 250.0, 4, 50).unwrap();
    harness.chain.fail_next_submit("paper-simulated-rpc-outage");
    service.execute(&failing, 0).await.unwrap_err();

    let unrelated = ExecutionIntent::open_position(Market::SolUsd, Side::Short, CollateralMint::Usdc, 100.0, 2, 50).unwrap();
    let outcome = service.execute(&unrelated, 0).await.unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Confirmed { .. }), "a failure on one intent must not poison a different idempotency key");
    assert_eq!(harness.chain.submit_count(), 1);
}
