//! Built-in defaults used when neither a flag nor an environment variable is set.

/// Directory that receives archived media.
pub const DEFAULT_SAVE_DIR: &str = "telegram_messages";

/// Subdirectory of the save directory holding per-day metadata files.
pub const CACHE_DIR_NAME: &str = ".cache";

/// Maximum accepted file size in MiB.
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 2000;

/// Quiet period after the last album member before the batch is archived.
pub const DEFAULT_GROUP_DELAY_SECS: u64 = 10;

/// Message sent to every monitored chat on startup.
pub const DEFAULT_GREETING: &str = "🤖 Archiver online, archiving incoming media.";

/// Largest file the public Bot API server lets bots download.
pub const PUBLIC_API_DOWNLOAD_LIMIT_MB: u64 = 20;
