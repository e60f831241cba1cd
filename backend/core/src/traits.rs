use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Media;

/// Outbound side of a chat client: what the archiver needs from it.
///
/// Implemented by the Telegram adapter; tests use in-memory fakes.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Human-readable client name for logging.
    fn name(&self) -> &str;

    /// Send a text message to `chat_id`, optionally as a reply to `reply_to`.
    async fn send_message(&self, chat_id: i64, text: &str, reply_to: Option<i32>) -> Result<()>;

    /// Transfer the file behind `media` into `destination`.
    ///
    /// The caller owns naming and collision handling; this writes exactly
    /// the given path.
    async fn download(&self, media: &Media, destination: &Path) -> Result<()>;
}
