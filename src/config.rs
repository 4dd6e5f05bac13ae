// src/config.rs
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Settings shared by both processes.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub schema_path: String,
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub storage: StorageConfig,
    pub bind_addr: SocketAddr,
    pub workers: usize,
}

#[derive(Clone)]
pub struct NotifierConfig {
    pub storage: StorageConfig,
    pub bot_token: String,
    pub chat_id: i64,
    pub api_base: String,
    pub interval: Duration,
}

// The bot token must not end up in logs.
impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("storage", &self.storage)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("interval", &self.interval)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn or_default(value: Option<String>, default: &str) -> String {
    non_empty(value).unwrap_or_else(|| default.to_string())
}

impl StorageConfig {
    fn from_vars(get: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            database_path: PathBuf::from(or_default(get("DATABASE_PATH"), "complaints.sqlite3")),
            schema_path: or_default(get("SCHEMA_PATH"), "sql/schema.sql"),
            upload_dir: PathBuf::from(or_default(get("UPLOAD_DIR"), "uploads")),
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = or_default(get("BIND_ADDR"), "127.0.0.1:3000")
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 127.0.0.1:3000")?;

        let workers = or_default(get("WEB_WORKERS"), "8")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .context("WEB_WORKERS must be a positive number")?;

        Ok(WebConfig {
            storage: StorageConfig::from_vars(&get),
            bind_addr,
            workers,
        })
    }
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = non_empty(get("TELEGRAM_BOT_TOKEN"))
            .context("TELEGRAM_BOT_TOKEN environment variable is required")?;

        let chat_id = non_empty(get("TELEGRAM_CHAT_ID"))
            .context("TELEGRAM_CHAT_ID environment variable is required")?
            .trim()
            .parse::<i64>()
            .context("TELEGRAM_CHAT_ID must be a valid number")?;

        let api_base = or_default(get("TELEGRAM_API_BASE"), DEFAULT_TELEGRAM_API_BASE);

        let interval_secs = or_default(get("NOTIFY_INTERVAL_SECS"), "10")
            .parse::<u64>()
            .context("NOTIFY_INTERVAL_SECS must be a valid number")?;

        Ok(NotifierConfig {
            storage: StorageConfig::from_vars(&get),
            bot_token,
            chat_id,
            api_base,
            interval: Duration::from_secs(interval_secs),
        })
    }
}
