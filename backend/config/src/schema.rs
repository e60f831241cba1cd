//! Typed archiver configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::defaults::CACHE_DIR_NAME;
use crate::ConfigError;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiverConfig {
    pub bot_token: String,
    /// Chats to archive. Empty means every chat the bot can see.
    pub chat_ids: Vec<i64>,
    pub save_dir: PathBuf,
    pub max_file_size_bytes: u64,
    pub log_level: LogLevel,
    pub greeting: String,
    /// Custom Bot API server, e.g. a self-hosted `telegram-bot-api` instance.
    pub api_url: Option<String>,
    pub group_delay_secs: u64,
    /// Directory for the rolling NDJSON log file. Console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl ArchiverConfig {
    pub fn cache_dir(&self) -> PathBuf {
        self.save_dir.join(CACHE_DIR_NAME)
    }

    pub fn group_delay(&self) -> Duration {
        Duration::from_secs(self.group_delay_secs)
    }

    pub fn monitors_all_chats(&self) -> bool {
        self.chat_ids.is_empty()
    }
}

/// Log verbosity accepted on the command line and in `TELEGRAM_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidValue {
                key: "log level".into(),
                value: s.to_string(),
                reason: "expected DEBUG, INFO, WARNING or ERROR".into(),
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_directive())
    }
}
