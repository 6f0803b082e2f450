//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use parley_core::config::{self, Config};

mod commands;

#[derive(Parser)]
#[command(name = "parley")]
#[command(version)]
#[command(about = "Terminal client for a streaming chat service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interactive chat session (default)
    Chat {
        /// Sign in as this user ID (skips the prompt)
        #[arg(long, value_name = "ID")]
        user: Option<String>,
    },
    /// List conversations for a user
    Conversations {
        /// User ID whose conversations to list
        #[arg(long, value_name = "ID")]
        user: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

/// Logs go to stderr so they never interleave with the chat transcript.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load().context("load config")?;
    let base_url = config.resolve_base_url().context("resolve base URL")?;

    // default to chat mode
    let Some(command) = cli.command else {
        return commands::chat::run(&base_url, None).await;
    };

    match command {
        Commands::Chat { user } => commands::chat::run(&base_url, user.as_deref()).await,
        Commands::Conversations { user } => commands::conversations::run(&base_url, &user).await,
        Commands::Config {
            command: ConfigCommands::Path,
        } => {
            println!("{}", config::paths::config_path().display());
            Ok(())
        }
    }
}
