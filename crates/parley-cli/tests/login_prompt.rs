//! Integration tests for the sign-in prompt and last-user persistence.

mod fixtures;

use fixtures::{mount_conversations, mount_empty_history, mount_start, parley_cmd};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::MockServer;

#[tokio::test]
async fn test_successful_login_remembers_user_id() {
    let server = MockServer::start().await;
    mount_start(&server, "s1").await;
    mount_empty_history(&server).await;
    mount_conversations(&server, json!({"conversations": null})).await;

    let home = TempDir::new().unwrap();
    parley_cmd(&server.uri(), home.path())
        .args(["chat", "--user", "alice"])
        .write_stdin("/quit\n")
        .assert()
        .success();

    let stored = std::fs::read_to_string(home.path().join("last_user")).unwrap();
    assert_eq!(stored.trim(), "alice");
}

#[tokio::test]
async fn test_prompt_prepopulates_last_user() {
    let server = MockServer::start().await;
    mount_start(&server, "s1").await;
    mount_empty_history(&server).await;
    mount_conversations(&server, json!({"conversations": null})).await;

    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("last_user"), "alice").unwrap();

    // An empty line accepts the prepopulated ID; it is never auto-submitted.
    parley_cmd(&server.uri(), home.path())
        .arg("chat")
        .write_stdin("\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("User ID [alice]:"))
        .stdout(predicate::str::contains("Signed in as alice."));
}

#[tokio::test]
async fn test_empty_user_id_shows_validation_notice_and_reprompts() {
    let server = MockServer::start().await;
    mount_start(&server, "s1").await;
    mount_empty_history(&server).await;
    mount_conversations(&server, json!({"conversations": null})).await;

    let home = TempDir::new().unwrap();
    parley_cmd(&server.uri(), home.path())
        .arg("chat")
        .write_stdin("\nbob\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[!] User ID is required"))
        .stdout(predicate::str::contains("Signed in as bob."));
}

#[tokio::test]
async fn test_signout_returns_to_prompt() {
    let server = MockServer::start().await;
    mount_start(&server, "s1").await;
    mount_empty_history(&server).await;
    mount_conversations(&server, json!({"conversations": null})).await;

    let home = TempDir::new().unwrap();
    parley_cmd(&server.uri(), home.path())
        .args(["chat", "--user", "alice"])
        .write_stdin("/signout\nbob\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out."))
        .stdout(predicate::str::contains("Signed in as bob."))
        .stdout(predicate::str::contains("Goodbye!"));
}
