use std::fmt::Display;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, MessageId, ReplyParameters};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use archiver_core::{ChatMessage, Media, MessagingClient, Sender};
use archiver_logging::redact_sensitive_data;

use crate::ChannelAdapter;
use crate::telegram_media::media_of;

/// Long-polling receiver for bot updates.
pub struct TelegramAdapter {
    bot: Bot,
}

impl TelegramAdapter {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChannelAdapter for TelegramAdapter {
    fn name(&self) -> &str {
        "telegram"
    }

    /// Dispatch until Ctrl-C. Group messages and channel posts are both
    /// forwarded; `tx` is dropped on return.
    async fn start(&self, tx: mpsc::Sender<ChatMessage>) -> anyhow::Result<()> {
        info!("Starting Telegram adapter");

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(forward))
            .branch(Update::filter_channel_post().endpoint(forward));

        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![tx])
            .default_handler(|update| async move {
                debug!(update_id = ?update.id, "Ignoring unsupported update");
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram adapter stopped");
        Ok(())
    }
}

async fn forward(msg: Message, tx: mpsc::Sender<ChatMessage>) -> ResponseResult<()> {
    let message = to_chat_message(&msg);
    debug!(
        chat_id = message.chat_id,
        message_id = message.id,
        has_media = message.has_media(),
        "Received Telegram message"
    );
    if tx.send(message).await.is_err() {
        warn!(chat_id = msg.chat.id.0, message_id = msg.id.0, "Ingestion channel closed; dropping message");
    }
    respond(())
}

/// Convert a Telegram message into the archiver's message model.
pub fn to_chat_message(msg: &Message) -> ChatMessage {
    let mut message = ChatMessage::new(msg.id.0, msg.chat.id.0, msg.date);
    message.media_group_id = msg.media_group_id().map(ToString::to_string);
    message.sender = msg.from.as_ref().map(|user| Sender {
        id: user.id.0,
        username: user.username.clone(),
        first_name: Some(user.first_name.clone()),
        last_name: user.last_name.clone(),
    });
    message.text = msg.text().map(str::to_string);
    message.caption = msg.caption().map(str::to_string);
    message.media = media_of(msg);
    message
}

/// Outbound Bot API client: replies and file downloads.
#[derive(Clone)]
pub struct TelegramClient {
    bot: Bot,
    /// Set when talking to a self-hosted Bot API server, which may hand out
    /// local file paths instead of download URLs.
    local_server: bool,
}

impl TelegramClient {
    pub fn new(token: &str, api_url: Option<&str>) -> anyhow::Result<Self> {
        let mut bot = Bot::new(token);
        if let Some(raw) = api_url {
            let url = url::Url::parse(raw).with_context(|| format!("Invalid Bot API URL: {raw}"))?;
            info!(api_url = %url, "Using custom Bot API server");
            bot = bot.set_api_url(url);
        }
        Ok(Self {
            bot,
            local_server: api_url.is_some(),
        })
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// Username of the bot behind the token. Fails fast on a revoked token.
    pub async fn identity(&self) -> anyhow::Result<String> {
        let me = self.bot.get_me().await.map_err(redacted)?;
        Ok(me.username().to_string())
    }
}

#[async_trait]
impl MessagingClient for TelegramClient {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> anyhow::Result<()> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        request.await.map_err(redacted)?;
        Ok(())
    }

    async fn download(&self, media: &Media, destination: &Path) -> anyhow::Result<()> {
        let file = self
            .bot
            .get_file(FileId(media.file_id().to_string()))
            .await
            .map_err(redacted)?;

        let local = Path::new(&file.path);
        if self.local_server && local.is_absolute() {
            tokio::fs::copy(local, destination)
                .await
                .with_context(|| format!("Failed to copy {}", local.display()))?;
            return Ok(());
        }

        let mut dst = tokio::fs::File::create(destination).await?;
        self.bot.download_file(&file.path, &mut dst).await.map_err(redacted)?;
        dst.flush().await?;
        Ok(())
    }
}

/// Bot API errors can embed the request URL, token included.
fn redacted(e: impl Display) -> anyhow::Error {
    anyhow::anyhow!(redact_sensitive_data(&e.to_string()))
}
