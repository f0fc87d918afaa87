//! Live-control arm/disarm engine (§4.4).
//!
//! `prepare_arm` issues a random challenge string the operator must echo
//! back via `confirm_arm` within `challenge_ttl`. This two-step flow exists
//! so arming LIVE mode can never happen from a single accidental keystroke
//! or a replayed CLI invocation.

use crate::types::{DisarmReason, LiveControlState};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const CHALLENGE_TTL_SECONDS: i64 = 120;

fn generate_challenge() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            ALPHABET[idx] as char
        })
        .collect()
}

/// Begin the arm sequence. Only valid from `Disarmed`; arming again from
/// `PendingConfirmation` or `Armed` is a no-op error the caller surfaces to
/// the operator rather than silently resetting an in-flight challenge.
pub fn prepare_arm(current: &LiveControlState, now: DateTime<Utc>) -> Result<LiveControlState, ArmError> {
    match current {
        LiveControlState::Disarmed { .. } => Ok(LiveControlState::PendingConfirmation {
            challenge: generate_challenge(),
            requested_at: now,
            expires_at: now + Duration::seconds(CHALLENGE_TTL_SECONDS),
        }),
        LiveControlState::PendingConfirmation { .. } => Err(ArmError::AlreadyPending),
        LiveControlState::Armed { .. } => Err(ArmError::AlreadyArmed),
    }
}

/// Complete the arm sequence. The provided `response` must match the
/// outstanding challenge exactly and `now` must be before its expiry.
pub fn confirm_arm(
    current: &LiveControlState,
    response: &str,
    now: DateTime<Utc>,
) -> Result<LiveControlState, ArmError> {
    match current {
        LiveControlState::PendingConfirmation { challenge, expires_at, .. } => {
            if now > *expires_at {
                return Ok(LiveControlState::Disarmed {
                    reason: DisarmReason::ChallengeExpired,
                });
            }
            if response != challenge {
                return Err(ArmError::ChallengeMismatch);
            }
            Ok(LiveControlState::Armed { armed_at: now })
        }
        LiveControlState::Disarmed { .. } => Err(ArmError::NoPendingChallenge),
        LiveControlState::Armed { .. } => Err(ArmError::AlreadyArmed),
    }
}

pub fn disarm() -> LiveControlState {
    LiveControlState::Disarmed {
        reason: DisarmReason::ManualDisarm,
    }
}

/// Daily guardrail check (§4.4): if the daily loss limit has been breached,
/// the system must auto-disarm regardless of its current state.
pub fn check_daily_guardrail(current: &LiveControlState, loss_limit_breached: bool) -> Option<LiveControlState> {
    if loss_limit_breached && !matches!(current, LiveControlState::Disarmed { reason: DisarmReason::DailyGuardrailBreach }) {
        Some(LiveControlState::Disarmed {
            reason: DisarmReason::DailyGuardrailBreach,
        })
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmError {
    AlreadyPending,
    AlreadyArmed,
    ChallengeMismatch,
    NoPendingChallenge,
}

impl std::fmt::Display for ArmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArmError::AlreadyPending => "an arm challenge is already outstanding",
            ArmError::AlreadyArmed => "system is already armed",
            ArmError::ChallengeMismatch => "confirmation does not match the outstanding challenge",
            ArmError::NoPendingChallenge => "no arm challenge is outstanding; call prepare_arm first",
        };
        f.write_str(s)
    }
}

impl std::error::Error for ArmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_then_confirm_with_matching_response_arms() {
        let now = Utc::now();
        let disarmed = LiveControlState::Disarmed { reason: DisarmReason::BootDefault };
        let pending = prepare_arm(&disarmed, now).unwrap();
        let challenge = match &pending {
            LiveControlState::PendingConfirmation { challenge, .. } => challenge.clone(),
            _ => panic!("expected pending"),
        };
        let armed = confirm_arm(&pending, &challenge, now + Duration::seconds(1)).unwrap();
        assert!(armed.is_armed());
    }

    #[test]
    fn confirm_with_wrong_response_is_rejected() {
        let now = Utc::now();
        let disarmed = LiveControlState::Disarmed { reason: DisarmReason::BootDefault };
        let pending = prepare_arm(&disarmed, now).unwrap();
        let err = confirm_arm(&pending, "WRONGCODE", now).unwrap_err();
        assert_eq!(err, ArmError::ChallengeMismatch);
    }

    #[test]
    fn confirm_after_expiry_falls_back_to_disarmed() {
        let now = Utc::now();
        let disarmed = LiveControlState::Disarmed { reason: DisarmReason::BootDefault };
        let pending = prepare_arm(&disarmed, now).unwrap();
        let challenge = match &pending {
            LiveControlState::PendingConfirmation { challenge, .. } => challenge.clone(),
            _ => unreachable!(),
        };
        let late = now + Duration::seconds(CHALLENGE_TTL_SECONDS + 1);
        let result = confirm_arm(&pending, &challenge, late).unwrap();
        assert_eq!(result, LiveControlState::Disarmed { reason: DisarmReason::ChallengeExpired });
    }

    #[test]
    fn daily_guardrail_breach_disarms_an_armed_system() {
        let armed = LiveControlState::Armed { armed_at: Utc::now() };
        let result = check_daily_guardrail(&armed, true).unwrap();
        assert_eq!(result, LiveControlState::Disarmed { reason: DisarmReason::DailyGuardrailBreach });
    }

    #[test]
    fn daily_guardrail_no_breach_is_a_noop() {
        let armed = LiveControlState::Armed { armed_at: Utc::now() };
        assert!(check_daily_guardrail(&armed, false).is_none());
    }
}
