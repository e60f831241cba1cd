//! Structured Logger
//!
//! Wraps `tracing` to provide console output, an optional daily-rotated NDJSON
//! file, and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose chatter is capped at `warn` regardless of the chosen level.
const QUIET_TARGETS: &[&str] = &["teloxide", "reqwest", "hyper"];

/// Build the filter directive for `level`, keeping client libraries quiet.
pub fn filter_directive(level: &str) -> String {
    let mut directive = level.to_string();
    for target in QUIET_TARGETS {
        directive.push_str(&format!(",{target}=warn"));
    }
    directive
}

/// Initialize the global logger.
///
/// `RUST_LOG` takes precedence over `level`. When `log_dir` is given, a
/// rolling file `archiver.log.YYYY-MM-DD` receives JSON lines as well.
pub fn init_logger(level: &str, log_dir: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));

    let file_layer = log_dir.map(|dir| {
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "archiver.log");
        fmt::layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false)
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_caps_client_crates() {
        let directive = filter_directive("debug");
        assert!(directive.starts_with("debug,"));
        assert!(directive.contains("teloxide=warn"));
        assert!(directive.contains("reqwest=warn"));
    }

    #[test]
    fn directive_parses_as_filter() {
        assert!(EnvFilter::try_new(filter_directive("info")).is_ok());
    }
}
