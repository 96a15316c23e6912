//! Minimal Bot API client over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use glossa_core::{
    AdapterError, AdapterResult, ChatId, MessageSender, RenderMode, SendOptions, TransportError,
    TransportResult,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::trace;

use crate::config::TelegramConfig;
use crate::model::{ApiResponse, Update, User};

/// Bot API client bound to one token.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    poll_timeout: Duration,
    request_timeout: Duration,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout", &self.poll_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Creates a client from the adapter configuration.
    pub fn new(config: &TelegramConfig) -> AdapterResult<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| AdapterError::Startup(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.bot_token
            ),
            poll_timeout: config.poll_timeout(),
            request_timeout: config.request_timeout(),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Duration,
    ) -> TransportResult<T> {
        trace!(method, "Bot API call");

        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            // reqwest errors can embed the URL, which carries the token.
            .map_err(|e| TransportError::Http(e.without_url().to_string()))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.without_url().to_string()))?;
        envelope.into_result()
    }

    /// Returns the bot's own user.
    pub async fn get_me(&self) -> TransportResult<User> {
        self.call("getMe", &json!({}), self.request_timeout).await
    }

    /// Long-polls for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> TransportResult<Vec<Update>> {
        let body = build_updates_body(offset, self.poll_timeout);
        self.call("getUpdates", &body, self.poll_timeout + self.request_timeout)
            .await
    }

    /// Sends one text message.
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        options: SendOptions,
    ) -> TransportResult<()> {
        let body = build_send_body(chat_id, text, options);
        let _: Value = self
            .call("sendMessage", &body, self.request_timeout)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        options: SendOptions,
    ) -> TransportResult<()> {
        self.send_message(chat_id, text, options).await
    }
}

/// Builds the `getUpdates` request body.
pub fn build_updates_body(offset: Option<i64>, timeout: Duration) -> Value {
    let mut body = json!({
        "timeout": timeout.as_secs(),
        "allowed_updates": ["message"],
    });
    if let Some(offset) = offset {
        body["offset"] = json!(offset);
    }
    body
}

/// Builds the `sendMessage` request body.
pub fn build_send_body(chat_id: ChatId, text: &str, options: SendOptions) -> Value {
    let mut body = json!({
        "chat_id": chat_id.0,
        "text": text,
    });
    if options.render_mode == RenderMode::LightMarkup {
        body["parse_mode"] = json!("Markdown");
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_body_markup() {
        let body = build_send_body(ChatId(42), "*Bias*", SendOptions::MARKUP);
        assert_eq!(
            body,
            json!({"chat_id": 42, "text": "*Bias*", "parse_mode": "Markdown"})
        );
    }

    #[test]
    fn test_send_body_plain_has_no_parse_mode() {
        let body = build_send_body(ChatId(42), "a_b", SendOptions::PLAIN);
        assert!(body.get("parse_mode").is_none());
    }

    #[test]
    fn test_updates_body() {
        let body = build_updates_body(Some(11), Duration::from_secs(30));
        assert_eq!(body["offset"], 11);
        assert_eq!(body["timeout"], 30);
        assert_eq!(body["allowed_updates"], json!(["message"]));

        assert!(build_updates_body(None, Duration::from_secs(30))
            .get("offset")
            .is_none());
    }

    #[test]
    fn test_base_url_trims_slash() {
        let mut config = TelegramConfig::new("123:abc");
        config.api_base_url = "http://localhost:8081/".into();
        let client = TelegramClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:8081/bot123:abc");
    }
}
