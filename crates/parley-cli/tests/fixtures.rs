//! Mock-server helpers for integration tests.

#![allow(dead_code)]

use std::path::Path;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts `/api/chat/start` returning the given session ID indefinitely.
pub async fn mount_start(server: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat/start"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"sessionID": session_id, "success": true})),
        )
        .mount(server)
        .await;
}

/// Mounts `/api/chat/start` returning the given session ID exactly once.
///
/// Mount order matters: wiremock serves the earliest matching mock, so
/// mount the one-shot before the fallback.
pub async fn mount_start_once(server: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat/start"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"sessionID": session_id, "success": true})),
        )
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// Mounts `/api/chat/history` with no stored messages.
pub async fn mount_empty_history(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/chat/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messages": null})))
        .mount(server)
        .await;
}

/// Mounts `/api/user/conversations` with the given response body.
pub async fn mount_conversations(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/user/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts `/api/chat/stream` answering with a raw chunked text body.
pub async fn mount_stream_text(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/api/chat/stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(text.as_bytes().to_vec(), "text/plain"),
        )
        .mount(server)
        .await;
}

/// Mounts a successful `/api/chat/delete`.
pub async fn mount_delete_success(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/chat/delete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(server)
        .await;
}

/// A `parley` command wired to the mock server and an isolated home.
pub fn parley_cmd(server_uri: &str, home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("parley");
    cmd.env("PARLEY_BASE_URL", server_uri)
        .env("PARLEY_HOME", home)
        .env("RUST_LOG", "error");
    cmd
}
