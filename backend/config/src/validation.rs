//! Config validation: checks that do not prevent startup but deserve a warning,
//! and a few that do.

use thiserror::Error;

use crate::defaults::PUBLIC_API_DOWNLOAD_LIMIT_MB;
use crate::schema::ArchiverConfig;

/// A config validation finding with field name and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All findings of one validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a resolved config.
pub fn validate(config: &ArchiverConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    if config.max_file_size_bytes == 0 {
        report.error("max_file_size_mb", "must be greater than zero");
    }

    let public_limit = PUBLIC_API_DOWNLOAD_LIMIT_MB * 1024 * 1024;
    if config.api_url.is_none() && config.max_file_size_bytes > public_limit {
        report.warn(
            "max_file_size_mb",
            format!(
                "the public Bot API server refuses downloads over {PUBLIC_API_DOWNLOAD_LIMIT_MB} MB; \
                 larger files will be reported as failed unless api_url points at a local server"
            ),
        );
    }

    if config.group_delay_secs == 0 {
        report.warn(
            "group_delay_secs",
            "zero delay archives album members one by one as they arrive",
        );
    }

    if !config.bot_token.contains(':') {
        report.warn("bot_token", "does not look like a Bot API token (<id>:<secret>)");
    }

    report
}
