//! Message ingestion: allowlist filtering in front of the group buffer.

use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::{debug, info};

use archiver_core::ChatMessage;
use archiver_scheduler::GroupBuffer;

/// Chats whose messages are archived. Empty means every chat.
#[derive(Debug, Clone, Default)]
pub struct ChatFilter {
    allowed: HashSet<i64>,
}

impl ChatFilter {
    pub fn new(chat_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: chat_ids.into_iter().collect(),
        }
    }

    pub fn allows(&self, chat_id: i64) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&chat_id)
    }

    /// Whether `message` should reach the group buffer.
    pub fn admit(&self, message: &ChatMessage) -> bool {
        if !self.allows(message.chat_id) {
            debug!(chat_id = message.chat_id, message_id = message.id, "Ignoring message from unmonitored chat");
            return false;
        }
        if !message.has_media() {
            debug!(chat_id = message.chat_id, message_id = message.id, "Skipping message without media");
            return false;
        }
        true
    }
}

/// Feed admitted messages from `rx` into `buffer` until the channel closes.
/// Returns the number of messages buffered.
pub async fn run_ingest(mut rx: mpsc::Receiver<ChatMessage>, filter: ChatFilter, buffer: GroupBuffer) -> usize {
    let mut accepted = 0;
    while let Some(message) = rx.recv().await {
        if !filter.admit(&message) {
            continue;
        }
        debug!(
            chat_id = message.chat_id,
            message_id = message.id,
            group = ?message.media_group_id,
            "Buffering media message"
        );
        buffer.add(message).await;
        accepted += 1;
    }
    info!(accepted, "Ingestion stopped");
    accepted
}
