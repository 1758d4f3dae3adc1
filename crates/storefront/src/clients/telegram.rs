//! Telegram Bot API client for shop-channel notifications.
//!
//! One call: `sendMessage`. Notification failures are logged by callers
//! and never fail the request that triggered them.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::TelegramConfig;

/// Bot API base URL.
const BASE_URL: &str = "https://api.telegram.org";

/// Errors that can occur when sending a Telegram message.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Bot API rejected the call.
    #[error("API error: {description}")]
    Api { description: String },
}

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    inner: Arc<TelegramClientInner>,
}

struct TelegramClientInner {
    client: reqwest::Client,
    bot_token: SecretString,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramClient {
    /// Create a new Telegram client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(TelegramClientInner {
                client,
                bot_token: config.bot_token.clone(),
                chat_id: config.chat_id.clone(),
            }),
        })
    }

    /// Send a plain-text message to the shop channel.
    ///
    /// # Errors
    ///
    /// Returns `TelegramError` if the request fails or the Bot API says no.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let url = format!(
            "{BASE_URL}/bot{}/sendMessage",
            self.inner.bot_token.expose_secret()
        );

        let response = self
            .inner
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: &self.inner.chat_id,
                text,
            })
            .send()
            .await?;

        let body: ApiResponse = response.json().await?;
        if !body.ok {
            return Err(TelegramError::Api {
                description: body
                    .description
                    .unwrap_or_else(|| "unknown error".to_owned()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_request_shape() {
        let request = SendMessageRequest {
            chat_id: "-1001234567890",
            text: "Order #7 paid",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["chat_id"], "-1001234567890");
        assert_eq!(json["text"], "Order #7 paid");
    }

    #[test]
    fn test_api_response_parses_failure() {
        let body = r#"{"ok": false, "description": "Bad Request: chat not found"}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(!parsed.ok);
        assert_eq!(
            parsed.description.as_deref(),
            Some("Bad Request: chat not found")
        );
    }

    #[test]
    fn test_api_response_parses_success() {
        let body = r#"{"ok": true, "result": {"message_id": 1}}"#;
        let parsed: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.ok);
    }
}
