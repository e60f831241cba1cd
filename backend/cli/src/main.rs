mod args;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use archiver_channels::{ChannelAdapter, TelegramAdapter, TelegramClient};
use archiver_config::ArchiverConfig;
use archiver_core::MessagingClient;
use archiver_logging::{init_logger, redact_sensitive_data};
use archiver_media::format_file_size;
use archiver_pipeline::{run_ingest, send_greetings, BatchProcessor, ChatFilter, MetadataStore};
use archiver_scheduler::GroupBuffer;

use args::Cli;

/// Capacity of the adapter to ingestion channel.
const INGEST_QUEUE: usize = 256;

const EXIT_CONFIG_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match archiver_config::resolve(cli.into()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    init_logger(config.log_level.as_directive(), config.log_dir.as_deref());

    if let Err(e) = archiver_config::check(&config) {
        error!(error = %e, "Invalid configuration");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %redact_sensitive_data(&format!("{e:#}")), "Archiver failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ArchiverConfig) -> Result<()> {
    tokio::fs::create_dir_all(&config.save_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.save_dir.display()))?;
    let save_dir = tokio::fs::canonicalize(&config.save_dir).await?;
    let config = ArchiverConfig { save_dir, ..config };

    info!(
        config = %archiver_config::redacted(&config),
        "Starting Telegram media archiver"
    );

    let telegram = TelegramClient::new(&config.bot_token, config.api_url.as_deref())?;
    let username = telegram.identity().await.context("Failed to reach the Bot API")?;
    info!(bot = %username, "Authorized");

    let client: Arc<dyn MessagingClient> = Arc::new(telegram.clone());
    let store = Arc::new(MetadataStore::new(config.cache_dir()));
    let processor = Arc::new(BatchProcessor::new(
        client.clone(),
        store,
        &config.save_dir,
        config.max_file_size_bytes,
    ));
    let buffer = GroupBuffer::new(config.group_delay(), processor);

    let (tx, rx) = mpsc::channel(INGEST_QUEUE);
    let ingest = tokio::spawn(run_ingest(
        rx,
        ChatFilter::new(config.chat_ids.iter().copied()),
        buffer.clone(),
    ));

    let greeted = send_greetings(&client, &config.chat_ids, &config.greeting).await;
    if !config.monitors_all_chats() {
        info!(chats = ?config.chat_ids, greeted, "Monitoring configured chats");
    }

    info!(
        save_dir = %config.save_dir.display(),
        max_file_size = %format_file_size(config.max_file_size_bytes),
        group_delay_secs = config.group_delay_secs,
        "Archiver ready"
    );

    let adapter = TelegramAdapter::new(telegram.bot());
    let result = adapter.start(tx).await;

    match ingest.await {
        Ok(accepted) => info!(accepted, "Ingestion drained"),
        Err(e) => warn!(error = %e, "Ingestion task ended abnormally"),
    }
    buffer.flush().await;

    info!("Archiver stopped");
    result
}
