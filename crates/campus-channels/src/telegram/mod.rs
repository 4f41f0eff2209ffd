//! Telegram Bot API channel.
//!
//! Uses long polling via `getUpdates`; messages and callback queries
//! both arrive through the same update stream. Responses go out as
//! `sendMessage`/`sendPhoto`, in-place updates as `editMessageText`/
//! `editMessageMedia`.
//! Docs: <https://core.telegram.org/bots/api>

mod polling;
pub(crate) mod send;
pub(crate) mod types;

use campus_core::config::TelegramConfig;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;

/// The bot's own identity, fetched once via `getMe` at startup.
#[derive(Debug, Clone)]
pub(crate) struct BotIdentity {
    pub id: i64,
    pub username: String,
}

/// Telegram channel using the Bot API with long polling.
pub struct TelegramChannel {
    config: TelegramConfig,
    client: reqwest::Client,
    base_url: String,
    /// Tracks the last update_id to avoid reprocessing.
    last_update_id: Arc<Mutex<Option<i64>>>,
    identity: OnceLock<BotIdentity>,
}

impl TelegramChannel {
    /// Create a new Telegram channel from config.
    pub fn new(config: TelegramConfig) -> Self {
        let base_url = format!("https://api.telegram.org/bot{}", config.bot_token);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            config,
            client,
            base_url,
            last_update_id: Arc::new(Mutex::new(None)),
            identity: OnceLock::new(),
        }
    }
}
