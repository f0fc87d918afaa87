use chrono::{Duration, Utc};
use mqk_integrity::{confirm_arm, prepare_arm, DisarmReason, LiveControlState};

#[test]
fn full_arm_sequence_requires_correct_challenge_before_expiry() {
    let now = Utc::now();
    let boot = LiveControlState::boot(None);
    assert!(boot.is_disarmed());

    let pending = prepare_arm(&boot, now).expect("disarmed state may prepare_arm");
    let challenge = match &pending {
        LiveControlState::PendingConfirmation { challenge, .. } => challenge.clone(),
        other => panic!("expected PendingConfirmation, got {other:?}"),
    };

    // Wrong code leaves the system unarmed.
    assert!(confirm_arm(&pending, "not-the-code", now).is_err());

    // Correct code within the TTL arms the system.
    let armed = confirm_arm(&pending, &challenge, now + Duration::seconds(5)).unwrap();
    assert!(armed.is_armed());
}

#[test]
fn restart_never_trusts_a_persisted_armed_state() {
    let armed = LiveControlState::Armed { armed_at: Utc::now() };
    let rebooted = LiveControlState::boot(Some(armed));
    assert_eq!(rebooted, LiveControlState::Disarmed { reason: DisarmReason::BootDefault });
}
