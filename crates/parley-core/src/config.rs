//! Configuration management for parley.
//!
//! Loads configuration from ${PARLEY_HOME}/config.toml with sensible
//! defaults. The service base URL resolves env > config > default.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default chat service address (the server's default port).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable overriding the service base URL.
pub const BASE_URL_ENV: &str = "PARLEY_BASE_URL";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat service.
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the effective base URL with precedence: env > config > default.
    ///
    /// # Errors
    /// Returns an error if the resolved URL is not well-formed.
    pub fn resolve_base_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var(BASE_URL_ENV) {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.to_string());
            }
        }

        let trimmed = self.base_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }

        Ok(DEFAULT_BASE_URL.to_string())
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    Ok(())
}

pub mod paths {
    //! Path resolution for parley configuration and local state.
    //!
    //! PARLEY_HOME resolution order:
    //! 1. PARLEY_HOME environment variable (if set)
    //! 2. ~/.config/parley (default)

    use std::path::PathBuf;

    /// Returns the parley home directory.
    ///
    /// Checks PARLEY_HOME env var first, falls back to ~/.config/parley
    pub fn parley_home() -> PathBuf {
        if let Ok(home) = std::env::var("PARLEY_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("parley"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        parley_home().join("config.toml")
    }

    /// Returns the path to the file holding the last-used user ID.
    pub fn last_user_path() -> PathBuf {
        parley_home().join("last_user")
    }
}

/// Reads the last-used user ID, if any.
///
/// Used to prepopulate the sign-in prompt. Never auto-submitted: the user
/// still has to accept it.
pub fn load_last_user() -> Option<String> {
    let raw = fs::read_to_string(paths::last_user_path()).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Remembers the last-used user ID for the next sign-in prompt.
///
/// # Errors
/// Returns an error if the parley home directory cannot be written.
pub fn store_last_user(user_id: &str) -> Result<()> {
    let dir = paths::parley_home();
    fs::create_dir_all(&dir).context("Failed to create parley home directory")?;
    fs::write(paths::last_user_path(), user_id).context("Failed to store last user ID")
}
