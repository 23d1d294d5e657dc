//! # Bot Server - Telegram polling loop
//!
//! Owns the [`MacaronBot`] and the [`TelegramClient`] and shuttles between
//! them: long-poll for updates, route each one through the bot, deliver the
//! replies. Updates are handled strictly one at a time.
//!
//! Transport failures never stop the loop. They are logged by kind, counted,
//! and the next poll retries after a short pause. Only Ctrl-C ends [`run`].
//!
//! [`run`]: BotServer::run
//!
//! ```rust,no_run
//! use macaronbot::config::Config;
//! use macaronbot::macaron::BotServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?.apply_env();
//!     let mut server = BotServer::new(config).await?;
//!     server.run().await
//! }
//! ```

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use tokio::time::Duration;

use super::bot::{MacaronBot, Outgoing};
use crate::config::Config;
use crate::metrics;
use crate::telegram::{TelegramClient, TransportError, Update};

/// Pause after a failed poll before trying again.
const POLL_BACKOFF: Duration = Duration::from_secs(3);

/// Polls Telegram and feeds every update through the bot.
pub struct BotServer {
    bot: MacaronBot,
    client: TelegramClient,
    offset: Option<i64>,
}

impl BotServer {
    pub async fn new(config: Config) -> Result<Self> {
        if config.telegram.api_token.trim().is_empty() {
            return Err(anyhow!(
                "No Telegram API token configured.\n\n\
                SOLUTION: set telegram.api_token in config.toml or export MACARON_BOT_API_TOKEN."
            ));
        }
        let client = TelegramClient::new(&config.telegram)
            .map_err(|e| anyhow!("Failed to build Telegram client: {}", e))?;
        let bot = MacaronBot::new(config).await?;
        Ok(Self {
            bot,
            client,
            offset: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("{} polling for updates", self.bot.config().bot.name);
        loop {
            tokio::select! {
                polled = self.client.get_updates(self.offset) => {
                    match polled {
                        Ok(updates) => {
                            for update in updates {
                                self.offset = Some(update.update_id + 1);
                                self.route_update(update).await;
                            }
                        }
                        Err(e) => {
                            log_transport_error("getUpdates", &e);
                            tokio::time::sleep(POLL_BACKOFF).await;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }
        info!("Shutting down; {}", metrics::snapshot().summary());
        Ok(())
    }

    /// Handle one update and deliver whatever it produced.
    pub async fn route_update(&mut self, update: Update) {
        let replies = if let Some(cb) = update.callback_query {
            if let Err(e) = self.client.answer_callback_query(&cb.id).await {
                log_transport_error("answerCallbackQuery", &e);
            }
            let chat = cb.chat_id();
            match cb.data.as_deref() {
                Some(data) => self.bot.handle_callback(chat, data).await,
                None => Vec::new(),
            }
        } else if let Some(msg) = update.message {
            match msg.text.as_deref() {
                Some(text) => self.bot.handle_message(msg.chat.id, text).await,
                None => {
                    debug!("Ignoring non-text message {} in chat {}", msg.message_id, msg.chat.id);
                    Vec::new()
                }
            }
        } else {
            debug!("Ignoring update {} without message or callback", update.update_id);
            Vec::new()
        };
        for out in replies {
            self.deliver(out).await;
        }
    }

    async fn deliver(&self, out: Outgoing) {
        let chat = out.chat();
        let result = match &out {
            Outgoing::Text { text, .. } => self.client.send_message(chat, text).await,
            Outgoing::Prompt {
                text, accept, deny, ..
            } => self.client.send_prompt(chat, text, accept, deny).await,
            Outgoing::Animation { path, .. } => self.client.send_animation(chat, path).await,
        };
        if let Err(e) = result {
            log_transport_error(&format!("deliver to {}", chat), &e);
        }
    }
}

/// Log and count a transport failure; the caller carries on.
fn log_transport_error(context: &str, e: &TransportError) {
    metrics::inc_transport_errors();
    match e.kind() {
        "timeout" => debug!("{}: poll timed out", context),
        "unauthorized" => warn!("{}: token rejected by Telegram: {}", context, e),
        "forbidden" => warn!("{}: bot blocked or kicked: {}", context, e),
        "chat_migrated" => warn!("{}: chat migrated: {}", context, e),
        kind => warn!("{}: {} error: {}", context, kind, e),
    }
}
