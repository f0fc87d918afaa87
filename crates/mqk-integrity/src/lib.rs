//! Live-control integrity (§4.4/§6.6): the two-step arm/disarm state
//! machine that gates every LIVE transaction, plus the startup artifact
//! integrity check. Pure deterministic state-machine logic; the thin IO
//! edges (file persistence, hashing) are isolated in their own modules.

mod engine;
mod persistence;
mod startup_check;
mod types;

pub use engine::{check_daily_guardrail, confirm_arm, disarm, prepare_arm, ArmError, CHALLENGE_TTL_SECONDS};
pub use persistence::{load as load_control_state, save_atomic as save_control_state};
pub use startup_check::{sha256_hex, verify_startup_integrity};
pub use types::{DisarmReason, LiveControlState};
