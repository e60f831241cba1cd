use archiver_core::ChatMessage;
use async_trait::async_trait;
use tokio::sync::mpsc;

pub mod telegram;
pub mod telegram_media;

pub use telegram::{TelegramAdapter, TelegramClient, to_chat_message};
pub use telegram_media::media_of;

/// Inbound side of a chat platform.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Receive messages until the adapter is stopped, forwarding each one to `tx`.
    async fn start(&self, tx: mpsc::Sender<ChatMessage>) -> anyhow::Result<()>;
}
