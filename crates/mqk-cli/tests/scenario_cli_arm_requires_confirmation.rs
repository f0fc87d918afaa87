//! `mqk control arm` issues a challenge; `confirm-arm` only succeeds when the
//! operator echoes that exact challenge back.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn confirm_arm_without_the_right_challenge_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let runtime_dir = dir.path().to_str().unwrap();

    let mut arm_cmd = Command::cargo_bin("mqk-cli")?;
    let arm_output = arm_cmd.args(["control", "arm", "--runtime-dir", runtime_dir]).output()?;
    assert!(arm_output.status.success());

    let mut confirm_cmd = Command::cargo_bin("mqk-cli")?;
    confirm_cmd
        .args(["control", "confirm-arm", "--runtime-dir", runtime_dir, "--response", "WRONGCODE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("confirm_arm"));

    let mut status_cmd = Command::cargo_bin("mqk-cli")?;
    status_cmd
        .args(["control", "status", "--runtime-dir", runtime_dir])
        .assert()
        .success()
        .stdout(predicate::str::contains("PENDING_CONFIRMATION").or(predicate::str::contains("DISARMED")));

    Ok(())
}
