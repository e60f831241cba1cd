use std::path::PathBuf;

use archiver_config::ConfigOverrides;
use clap::Parser;

/// Flags take precedence over `TELEGRAM_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "tg-archiver")]
#[command(about = "Archive media posted to Telegram chats")]
#[command(version)]
pub struct Cli {
    /// Bot API token
    #[arg(long)]
    pub bot_token: Option<String>,

    /// Chat to monitor; repeat or comma-separate for several. Defaults to every chat
    #[arg(long = "chat-id", allow_negative_numbers = true)]
    pub chat_ids: Vec<String>,

    /// Directory downloaded files are saved to
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Largest file to download, in megabytes
    #[arg(long)]
    pub max_file_size_mb: Option<u64>,

    /// DEBUG, INFO, WARNING or ERROR
    #[arg(long)]
    pub log_level: Option<String>,

    /// Message sent to each monitored chat on startup
    #[arg(long)]
    pub greeting: Option<String>,

    /// Base URL of a self-hosted Bot API server
    #[arg(long)]
    pub api_url: Option<String>,

    /// Quiet period before an album is archived, in seconds
    #[arg(long)]
    pub group_delay_secs: Option<u64>,

    /// Also write JSON logs to daily files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        ConfigOverrides {
            bot_token: cli.bot_token,
            chat_ids: cli.chat_ids,
            save_dir: cli.save_dir,
            max_file_size_mb: cli.max_file_size_mb,
            log_level: cli.log_level,
            greeting: cli.greeting,
            api_url: cli.api_url,
            group_delay_secs: cli.group_delay_secs,
            log_dir: cli.log_dir,
        }
    }
}
