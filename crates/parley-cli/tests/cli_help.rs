use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("parley")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("conversations"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_chat_help_shows_user_flag() {
    cargo_bin_cmd!("parley")
        .args(["chat", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--user"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("parley")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
