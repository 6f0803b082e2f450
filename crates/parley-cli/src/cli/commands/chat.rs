//! Chat command handler.

use anyhow::{Context, Result};

use crate::modes;

pub async fn run(base_url: &str, user: Option<&str>) -> Result<()> {
    modes::run_interactive_chat(base_url, user)
        .await
        .context("interactive chat failed")
}
