//! Config redaction: produce a safe-to-log snapshot with the bot token masked.

use serde_json::Value;

use crate::schema::ArchiverConfig;

/// Mask a secret, keeping the first and last four characters as a hint.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Serialize the config with secrets masked, for startup logging.
pub fn redacted(config: &ArchiverConfig) -> Value {
    let mut value = serde_json::to_value(config).unwrap_or(Value::Null);
    if let Some(token) = value.get_mut("bot_token") {
        *token = Value::String(mask_secret(&config.bot_token));
    }
    value
}
