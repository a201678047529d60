use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_trustdeposit_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("trustdeposit")
}

#[test]
fn test_completion_command_help() {
    let mut cmd = Command::new(get_trustdeposit_bin());
    cmd.arg("completion").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Generate shell completion scripts"))
        .stdout(predicate::str::contains("SUPPORTED SHELLS"))
        .stdout(predicate::str::contains("~/.bashrc"));
}

#[test]
fn test_completion_bash_generates_script() {
    let mut cmd = Command::new(get_trustdeposit_bin());
    cmd.arg("completion").arg("--shell").arg("bash");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_trustdeposit()"))
        .stdout(predicate::str::contains("--matter-id"));
}

#[test]
fn test_completion_requires_shell() {
    let mut cmd = Command::new(get_trustdeposit_bin());
    cmd.arg("completion");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("--shell"));
}
