//! Startup greeting for monitored chats.

use std::sync::Arc;

use tracing::{error, info};

use archiver_core::MessagingClient;

/// Send `greeting` to every chat in `chat_ids`. Returns how many were
/// delivered; failures are logged and skipped.
pub async fn send_greetings(client: &Arc<dyn MessagingClient>, chat_ids: &[i64], greeting: &str) -> usize {
    if chat_ids.is_empty() {
        info!("Monitoring all chats");
        return 0;
    }

    let mut delivered = 0;
    for &chat_id in chat_ids {
        match client.send_message(chat_id, greeting, None).await {
            Ok(()) => {
                info!(chat_id, "Sent greeting");
                delivered += 1;
            }
            Err(e) => error!(chat_id, error = %format!("{e:#}"), "Failed to send greeting"),
        }
    }
    delivered
}
