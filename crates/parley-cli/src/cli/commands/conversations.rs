//! Conversations listing command.

use anyhow::{Context, Result};
use parley_core::api::ChatApiClient;

pub async fn run(base_url: &str, user: &str) -> Result<()> {
    let api = ChatApiClient::new(base_url);
    let summaries = api
        .list_conversations(user)
        .await
        .context("list conversations")?;

    if summaries.is_empty() {
        println!("No conversations for {user}.");
        return Ok(());
    }

    for summary in &summaries {
        println!("{}  ({} messages)", summary.session_id, summary.message_count);
    }
    Ok(())
}
