//! Resolution of the archiver config from command-line overrides, environment
//! variables and built-in defaults, in that order of precedence.
//!
//! The environment is passed in as a map so resolution is deterministic in tests.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::defaults::{
    DEFAULT_GREETING, DEFAULT_GROUP_DELAY_SECS, DEFAULT_MAX_FILE_SIZE_MB, DEFAULT_SAVE_DIR,
};
use crate::schema::{ArchiverConfig, LogLevel};
use crate::ConfigError;

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_SAVE_DIR: &str = "TELEGRAM_SAVE_DIR";
pub const ENV_MAX_FILE_SIZE_MB: &str = "TELEGRAM_MAX_FILE_SIZE_MB";
pub const ENV_LOG_LEVEL: &str = "TELEGRAM_LOG_LEVEL";
pub const ENV_GREETING: &str = "TELEGRAM_GREETING";
pub const ENV_API_URL: &str = "TELEGRAM_API_URL";
pub const ENV_GROUP_DELAY_SECS: &str = "TELEGRAM_GROUP_DELAY_SECS";
pub const ENV_LOG_DIR: &str = "TELEGRAM_LOG_DIR";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Values given explicitly on the command line. `None`/empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bot_token: Option<String>,
    pub chat_ids: Vec<String>,
    pub save_dir: Option<PathBuf>,
    pub max_file_size_mb: Option<u64>,
    pub log_level: Option<String>,
    pub greeting: Option<String>,
    pub api_url: Option<String>,
    pub group_delay_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

/// Resolve against the process environment.
pub fn resolve(overrides: ConfigOverrides) -> Result<ArchiverConfig, ConfigError> {
    resolve_with(overrides, &std::env::vars().collect())
}

/// Resolve against a provided environment map.
pub fn resolve_with(
    overrides: ConfigOverrides,
    env: &HashMap<String, String>,
) -> Result<ArchiverConfig, ConfigError> {
    let lookup = |key: &str| {
        env.get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    let bot_token = non_empty(overrides.bot_token)
        .or_else(|| lookup(ENV_BOT_TOKEN))
        .ok_or(ConfigError::MissingBotToken)?;

    let raw_chat_ids: Vec<String> = if overrides.chat_ids.is_empty() {
        lookup(ENV_CHAT_ID)
            .map(|list| split_list(&list))
            .unwrap_or_default()
    } else {
        overrides.chat_ids.iter().flat_map(|v| split_list(v)).collect()
    };
    let chat_ids = raw_chat_ids
        .iter()
        .map(|id| parse_number::<i64>("chat id", id))
        .collect::<Result<Vec<_>, _>>()?;

    let max_file_size_mb = match overrides.max_file_size_mb {
        Some(mb) => mb,
        None => match lookup(ENV_MAX_FILE_SIZE_MB) {
            Some(raw) => parse_number(ENV_MAX_FILE_SIZE_MB, &raw)?,
            None => DEFAULT_MAX_FILE_SIZE_MB,
        },
    };

    let group_delay_secs = match overrides.group_delay_secs {
        Some(secs) => secs,
        None => match lookup(ENV_GROUP_DELAY_SECS) {
            Some(raw) => parse_number(ENV_GROUP_DELAY_SECS, &raw)?,
            None => DEFAULT_GROUP_DELAY_SECS,
        },
    };

    let log_level = match non_empty(overrides.log_level).or_else(|| lookup(ENV_LOG_LEVEL)) {
        Some(raw) => raw.parse::<LogLevel>()?,
        None => LogLevel::default(),
    };

    let api_url = non_empty(overrides.api_url).or_else(|| lookup(ENV_API_URL));
    if let Some(url) = &api_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: ENV_API_URL.into(),
                value: url.clone(),
                reason: "must start with http:// or https://".into(),
            });
        }
    }

    Ok(ArchiverConfig {
        bot_token,
        chat_ids,
        save_dir: overrides
            .save_dir
            .or_else(|| lookup(ENV_SAVE_DIR).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR)),
        max_file_size_bytes: max_file_size_mb.saturating_mul(BYTES_PER_MB),
        log_level,
        greeting: non_empty(overrides.greeting)
            .or_else(|| lookup(ENV_GREETING))
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        api_url,
        group_delay_secs,
        log_dir: overrides
            .log_dir
            .or_else(|| lookup(ENV_LOG_DIR).map(PathBuf::from)),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: "not a valid integer".into(),
    })
}
