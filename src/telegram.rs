//! Minimal Telegram Bot API client.
//!
//! Only the handful of methods the bot needs: `getUpdates` long polling,
//! `sendMessage` (optionally with an accept/deny inline keyboard),
//! `answerCallbackQuery` and `sendAnimation` with a multipart upload.
//!
//! Failures are reported as [`TransportError`]; callers log them by
//! [`TransportError::kind`] and carry on.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::TelegramConfig;
use crate::logutil::preview;

/// Telegram rejects messages above 4096 characters; stay under it in bytes.
pub const MAX_MESSAGE_BYTES: usize = 4000;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error {code}: {description}")]
    Api { code: i32, description: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Coarse category used for logging decisions.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Http(e) if e.is_timeout() => "timeout",
            TransportError::Http(e) if e.is_decode() => "decode",
            TransportError::Http(_) => "network",
            TransportError::Api { code: 401, .. } => "unauthorized",
            TransportError::Api { code: 403, .. } => "forbidden",
            TransportError::Api { description, .. } if description.contains("migrated") => "chat_migrated",
            TransportError::Api { code: 400, .. } => "bad_request",
            TransportError::Api { code: 429, .. } => "rate_limited",
            TransportError::Api { .. } => "api",
            TransportError::Io(_) => "io",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i32>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, TransportError> {
        match (self.ok, self.result) {
            (true, Some(r)) => Ok(r),
            _ => Err(TransportError::Api {
                code: self.error_code.unwrap_or(0),
                description: self.description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: Sender,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub data: Option<String>,
}

impl CallbackQuery {
    /// Chat the prompt was shown in, falling back to the presser's user id.
    pub fn chat_id(&self) -> i64 {
        self.message.as_ref().map(|m| m.chat.id).unwrap_or(self.from.id)
    }
}

#[derive(Debug, Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineKeyboard<'a> {
    inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<InlineKeyboard<'a>>,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 2],
}

pub struct TelegramClient {
    client: reqwest::Client,
    base: String,
    poll_timeout: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, TransportError> {
        // The HTTP timeout has to outlive the long poll
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 15))
            .build()?;
        Ok(Self {
            client,
            base: format!("{}/bot{}", config.api_base.trim_end_matches('/'), config.api_token),
            poll_timeout: config.poll_timeout_secs,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base, method)
    }

    async fn call<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, TransportError> {
        let resp: ApiResponse<T> = self.client.post(self.url(method)).json(body).send().await?.json().await?;
        resp.into_result()
    }

    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TransportError> {
        let body = GetUpdates {
            offset,
            timeout: self.poll_timeout,
            allowed_updates: ["message", "callback_query"],
        };
        let updates: Vec<Update> = self.call("getUpdates", &body).await?;
        trace!("getUpdates offset={:?} -> {} updates", offset, updates.len());
        Ok(updates)
    }

    /// Send `text`, split into several messages when it is too long.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        for piece in chunk_text(text, MAX_MESSAGE_BYTES) {
            let body = SendMessage {
                chat_id,
                text: &piece,
                reply_markup: None,
            };
            let _: Message = self.call("sendMessage", &body).await?;
        }
        debug!("sent to {}: {}", chat_id, preview(text));
        Ok(())
    }

    /// Send `text` with a two-button ✔️ / ❌ keyboard.
    pub async fn send_prompt(&self, chat_id: i64, text: &str, accept: &str, deny: &str) -> Result<(), TransportError> {
        let body = SendMessage {
            chat_id,
            text,
            reply_markup: Some(InlineKeyboard {
                inline_keyboard: vec![vec![
                    InlineButton {
                        text: "✔️",
                        callback_data: accept,
                    },
                    InlineButton {
                        text: "❌",
                        callback_data: deny,
                    },
                ]],
            }),
        };
        let _: Message = self.call("sendMessage", &body).await?;
        debug!("prompted {}: {}", chat_id, preview(text));
        Ok(())
    }

    pub async fn answer_callback_query(&self, id: &str) -> Result<(), TransportError> {
        let _: bool = self
            .call("answerCallbackQuery", &serde_json::json!({ "callback_query_id": id }))
            .await?;
        Ok(())
    }

    pub async fn send_animation(&self, chat_id: i64, path: &Path) -> Result<(), TransportError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "animation.gif".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("animation", part);
        let resp: ApiResponse<Message> = self
            .client
            .post(self.url("sendAnimation"))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        resp.into_result()?;
        debug!("sent animation {} to {}", path.display(), chat_id);
        Ok(())
    }
}

/// Split `text` into pieces of at most `max_bytes`, preferring line breaks and
/// never cutting a UTF-8 sequence.
pub fn chunk_text(text: &str, max_bytes: usize) -> Vec<String> {
    if text.len() <= max_bytes {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= max_bytes {
            chunks.push(remaining.to_string());
            break;
        }
        let mut end = max_bytes;
        while end > 0 && !remaining.is_char_boundary(end) {
            end -= 1;
        }
        let slice = &remaining[..end];
        if let Some(pos) = slice.rfind('\n') {
            if pos > 0 && pos + 1 >= end / 2 {
                chunks.push(slice[..=pos].to_string());
                remaining = &remaining[pos + 1..];
                continue;
            }
        }
        chunks.push(slice.to_string());
        remaining = &remaining[end..];
    }
    chunks
}
