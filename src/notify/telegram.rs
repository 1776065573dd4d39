// src/notify/telegram.rs

//! Telegram Bot API notification backend.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::TelegramConfig;
use crate::error::{AppError, Result};
use crate::models::{DeliveryReceipt, MessageFormat, MessageOptions};
use crate::notify::Notifier;

/// Response envelope of the Bot API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<ApiMessage>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
}

/// Notifier posting to a single Telegram chat.
pub struct TelegramNotifier {
    client: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier for the configured destination.
    pub fn new(client: reqwest::Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    fn send_message_url(&self) -> String {
        format!("https://api.telegram.org/bot{}/sendMessage", self.token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str, options: &MessageOptions) -> Result<DeliveryReceipt> {
        let mut payload = json!({
            "chat_id": self.chat_id,
            "text": message,
            "disable_web_page_preview": options.disable_link_preview,
            "disable_notification": options.silent,
        });
        if options.format == MessageFormat::Html {
            payload["parse_mode"] = json!("HTML");
        }

        let response = self
            .client
            .post(self.send_message_url())
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::notify(format!("failed to send Telegram message: {e}")))?;

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::notify(format!("malformed Telegram response: {e}")))?;

        match (body.ok, body.result) {
            (true, Some(result)) => {
                info!("Telegram message sent: message id {}", result.message_id);
                Ok(DeliveryReceipt {
                    message_id: result.message_id,
                })
            }
            _ => Err(AppError::notify(format!(
                "Telegram API rejected the message: {}",
                body.description.unwrap_or_else(|| "unknown error".to_string())
            ))),
        }
    }
}
