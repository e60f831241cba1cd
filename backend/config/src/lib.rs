//! `archiver-config`: runtime configuration for the Telegram media archiver.
//!
//! Provides:
//! - Typed config schema
//! - Resolution from flags, environment variables and defaults
//! - Redaction for safe logging
//! - Validation with warnings and errors

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{resolve, resolve_with, ConfigOverrides};
pub use redact::{mask_secret, redacted};
pub use schema::{ArchiverConfig, LogLevel};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use thiserror::Error;

/// Errors that prevent a config from being resolved.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing bot token: set TELEGRAM_BOT_TOKEN or pass --bot-token")]
    MissingBotToken,

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("config validation failed: {0}")]
    Invalid(String),
}

/// Run validation on a resolved config, logging every finding. Errors fail
/// the check; warnings only get logged.
pub fn check(config: &ArchiverConfig) -> Result<(), ConfigError> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        return Err(ConfigError::Invalid(first.to_string()));
    }
    Ok(())
}

