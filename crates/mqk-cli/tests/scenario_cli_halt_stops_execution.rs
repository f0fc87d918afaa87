//! `mqk control disarm` unconditionally returns the live-control state
//! machine to Disarmed, overriding any outstanding arm challenge.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn disarm_overrides_a_pending_arm_challenge() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let runtime_dir = dir.path().to_str().unwrap();

    Command::cargo_bin("mqk-cli")?.args(["control", "arm", "--runtime-dir", runtime_dir]).assert().success();

    Command::cargo_bin("mqk-cli")?
        .args(["control", "disarm", "--runtime-dir", runtime_dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("state=DISARMED"));

    Command::cargo_bin("mqk-cli")?
        .args(["control", "status", "--runtime-dir", runtime_dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("DISARMED"));

    Ok(())
}
