//! `mqk control` — the operator-facing surface over the live-control
//! arm/disarm state machine (§4.4). Every transition is persisted
//! atomically to `control_state.json` and appended to `control_audit.log`.

use anyhow::{Context, Result};
use chrono::Utc;
use mqk_integrity::{confirm_arm as engine_confirm_arm, disarm as engine_disarm, prepare_arm as engine_prepare_arm};
use mqk_integrity::{load_control_state, save_control_state, LiveControlState};
use std::path::Path;

use super::{control_audit_log_path, control_state_path, new_invocation_id};

fn boot_state(runtime_dir: &Path) -> Result<LiveControlState> {
    let persisted = load_control_state(control_state_path(runtime_dir)).context("load control state")?;
    Ok(LiveControlState::boot(persisted))
}

fn audit(runtime_dir: &Path, event_type: &str, payload: serde_json::Value) -> Result<()> {
    let mut writer = mqk_audit::AuditWriter::new(control_audit_log_path(runtime_dir), true)?;
    writer.append(new_invocation_id(), "control", event_type, payload)?;
    Ok(())
}

pub fn arm(runtime_dir: &str) -> Result<()> {
    let runtime_dir = Path::new(runtime_dir);
    let current = boot_state(runtime_dir)?;

    let next = engine_prepare_arm(&current, Utc::now()).context("prepare_arm")?;
    save_control_state(control_state_path(runtime_dir), &next).context("save control state")?;

    let challenge = match &next {
        LiveControlState::PendingConfirmation { challenge, expires_at, .. } => {
            audit(runtime_dir, "prepare_arm", serde_json::json!({"expires_at": expires_at}))?;
            challenge.clone()
        }
        _ => unreachable!("prepare_arm always returns PendingConfirmation on success"),
    };

    println!("state=PENDING_CONFIRMATION challenge={challenge}");
    println!("run `mqk control confirm-arm --response {challenge}` before it expires");
    Ok(())
}

pub fn confirm_arm(runtime_dir: &str, response: &str) -> Result<()> {
    let runtime_dir = Path::new(runtime_dir);
    let current = boot_state(runtime_dir)?;

    let next = engine_confirm_arm(&current, response, Utc::now()).context("confirm_arm")?;
    save_control_state(control_state_path(runtime_dir), &next).context("save control state")?;

    match &next {
        LiveControlState::Armed { armed_at } => {
            audit(runtime_dir, "confirm_arm", serde_json::json!({"armed_at": armed_at}))?;
            println!("state=ARMED armed_at={}", armed_at.to_rfc3339());
        }
        LiveControlState::Disarmed { reason } => {
            audit(runtime_dir, "confirm_arm_expired", serde_json::json!({"reason": reason}))?;
            println!("state=DISARMED reason={reason:?}");
            anyhow::bail!("challenge expired before confirmation");
        }
        LiveControlState::PendingConfirmation { .. } => unreachable!("confirm_arm never returns PendingConfirmation"),
    }
    Ok(())
}

pub fn disarm(runtime_dir: &str) -> Result<()> {
    let runtime_dir = Path::new(runtime_dir);
    let next = engine_disarm();
    save_control_state(control_state_path(runtime_dir), &next).context("save control state")?;
    audit(runtime_dir, "disarm", serde_json::json!({}))?;
    println!("state=DISARMED reason=ManualDisarm");
    Ok(())
}

pub fn status(runtime_dir: &str) -> Result<()> {
    let runtime_dir = Path::new(runtime_dir);
    let current = boot_state(runtime_dir)?;
    match current {
        LiveControlState::Disarmed { reason } => println!("state=DISARMED reason={reason:?}"),
        LiveControlState::PendingConfirmation { expires_at, .. } => {
            println!("state=PENDING_CONFIRMATION expires_at={}", expires_at.to_rfc3339());
        }
        LiveControlState::Armed { armed_at } => println!("state=ARMED armed_at={}", armed_at.to_rfc3339()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_fresh_runtime_dir_boots_disarmed() {
        let dir = tempfile::tempdir().unwrap();
        status(dir.path().to_str().unwrap()).unwrap();
        let state = boot_state(dir.path()).unwrap();
        assert!(state.is_disarmed());
    }

    #[test]
    fn arm_then_confirm_with_wrong_response_does_not_arm() {
        let dir = tempfile::tempdir().unwrap();
        let runtime_dir = dir.path().to_str().unwrap();
        arm(runtime_dir).unwrap();
        assert!(confirm_arm(runtime_dir, "WRONG").is_err());
        let state = boot_state(dir.path()).unwrap();
        assert!(!state.is_armed());
    }

    #[test]
    fn disarm_overrides_any_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        let runtime_dir = dir.path().to_str().unwrap();
        arm(runtime_dir).unwrap();
        disarm(runtime_dir).unwrap();
        let state = boot_state(dir.path()).unwrap();
        assert!(state.is_disarmed());
    }
}
