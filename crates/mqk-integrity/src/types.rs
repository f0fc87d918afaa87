use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the system is currently disarmed. Preserved across restarts so an
/// operator can see the cause before re-arming.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisarmReason {
    /// Every boot starts disarmed regardless of the last persisted state.
    BootDefault,
    ManualDisarm,
    /// A daily guardrail (loss limit) tripped and auto-disarmed the system.
    DailyGuardrailBreach,
    /// The arm challenge expired before `confirm_arm` was called.
    ChallengeExpired,
    /// The startup integrity check failed.
    IntegrityCheckFailed,
}

/// The two-step live-control state machine (§4.4). `prepare_arm` moves
/// `Disarmed -> PendingConfirmation`; `confirm_arm` moves
/// `PendingConfirmation -> Armed` only if the caller echoes back the issued
/// challenge before it expires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiveControlState {
    Disarmed {
        reason: DisarmReason,
    },
    PendingConfirmation {
        challenge: String,
        requested_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    Armed {
        armed_at: DateTime<Utc>,
    },
}

impl LiveControlState {
    pub fn is_armed(&self) -> bool {
        matches!(self, LiveControlState::Armed { .. })
    }

    pub fn is_disarmed(&self) -> bool {
        matches!(self, LiveControlState::Disarmed { .. })
    }

    /// Fail-closed boot semantics: a persisted `Armed` or
    /// `PendingConfirmation` state is never trusted; every restart requires
    /// a fresh `prepare_arm`/`confirm_arm` round trip.
    pub fn boot(persisted: Option<LiveControlState>) -> Self {
        match persisted {
            Some(LiveControlState::Disarmed { reason }) => LiveControlState::Disarmed { reason },
            _ => LiveControlState::Disarmed {
                reason: DisarmReason::BootDefault,
            },
        }
    }
}
