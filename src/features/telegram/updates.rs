//! Incoming update types and the long-polling loop

use log::{error, info, warn};
use serde::Deserialize;
use std::time::Duration;

use super::client::{SendError, TelegramClient};
use super::commands::CommandHandler;

/// Seconds Telegram holds a getUpdates request open waiting for messages
pub const LONG_POLL_SECS: u64 = 30;

const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Poll for updates forever, handing every message to `handler`.
///
/// Errors are logged; a failed poll is retried after a short delay and a
/// failed command never stops the loop.
pub async fn poll_updates(client: TelegramClient, handler: CommandHandler) {
    if !client.is_configured() {
        warn!("Telegram bot token not configured - chat commands disabled");
        return;
    }

    info!("💬 Listening for Telegram commands (long polling)");
    let mut offset: Option<i64> = None;

    loop {
        let updates = match client.get_updates(offset, LONG_POLL_SECS).await {
            Ok(updates) => updates,
            Err(SendError::NotConfigured) => return,
            Err(e) => {
                warn!("Telegram getUpdates failed: {e}");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            if let Err(e) = handler.handle_update(&update).await {
                error!("Error handling Telegram update {}: {e:#}", update.update_id);
            }
        }
    }
}
