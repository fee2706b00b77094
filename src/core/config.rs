//! Environment configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_HELP_KEYWORD: &str = "help";
pub const DEFAULT_COOLDOWN_TICK_MS: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    /// Sole token that routes to the help hook
    pub help_keyword: String,
    /// Period of the cooldown decrement tick
    pub cooldown_tick: Duration,
    /// YAML file with command registrations
    pub routing_path: String,
}

impl Config {
    /// Read configuration from the process environment
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let tick_ms = match lookup("DISPATCH_COOLDOWN_TICK_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("DISPATCH_COOLDOWN_TICK_MS is not a number: {raw}"))?,
            None => DEFAULT_COOLDOWN_TICK_MS,
        };
        if tick_ms == 0 {
            anyhow::bail!("DISPATCH_COOLDOWN_TICK_MS must be greater than zero");
        }

        Ok(Config {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            help_keyword: lookup("DISPATCH_HELP_KEYWORD")
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_HELP_KEYWORD.to_string()),
            cooldown_tick: Duration::from_millis(tick_ms),
            routing_path: lookup("DISPATCH_ROUTING_PATH")
                .unwrap_or_else(|| "commands.yaml".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            help_keyword: DEFAULT_HELP_KEYWORD.to_string(),
            cooldown_tick: Duration::from_millis(DEFAULT_COOLDOWN_TICK_MS),
            routing_path: "commands.yaml".to_string(),
        }
    }
}
