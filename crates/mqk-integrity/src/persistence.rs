//! Atomic persistence of `LiveControlState` to `control_state.json` (§6.2).
//!
//! Writes go through a temp file + rename so a crash mid-write never leaves
//! a truncated or torn control-state file on disk.

use crate::types::LiveControlState;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn load(path: impl AsRef<Path>) -> Result<Option<LiveControlState>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read control state: {:?}", path))?;
    let state = serde_json::from_str(&raw).with_context(|| format!("parse control state: {:?}", path))?;
    Ok(Some(state))
}

pub fn save_atomic(path: impl AsRef<Path>, state: &LiveControlState) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let body = serde_json::to_string_pretty(state).context("serialize control state")?;
    fs::write(&tmp_path, body).with_context(|| format!("write {:?}", tmp_path))?;
    fs::rename(&tmp_path, path).with_context(|| format!("rename {:?} -> {:?}", tmp_path, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DisarmReason;

    #[test]
    fn round_trips_through_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control_state.json");
        let state = LiveControlState::Disarmed { reason: DisarmReason::ManualDisarm };
        save_atomic(&path, &state).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("control_state.json");
        assert!(load(&path).unwrap().is_none());
    }
}
