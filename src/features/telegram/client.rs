//! Telegram Bot API client
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: getUpdates long polling, long texts split across messages
//! - 1.0.0: sendMessage with HTML parse mode

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::updates::Update;
use crate::core::response::chunk_for_message;
use crate::core::Config;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Telegram bot token not configured")]
    NotConfigured,
    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error ({status}): {description}")]
    Api { status: u16, description: String },
}

/// Outbound message channel used by the dispatcher and the chat commands
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), SendError>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl TelegramClient {
    /// `timeout` must exceed the long-poll timeout passed to `get_updates`
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.telegram_api_url,
            config.telegram_bot_token.clone(),
            config.http_timeout,
        )
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch pending updates, waiting up to `timeout_secs` for new ones
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, SendError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        let updates: Option<Vec<Update>> = self.call("getUpdates", &request).await?;
        Ok(updates.unwrap_or_default())
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<Option<T>, SendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let token = self.token.as_deref().ok_or(SendError::NotConfigured)?;
        let url = format!("{}/bot{}/{}", self.api_url, token, method);

        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // Error bodies usually carry a JSON description; fall back to the raw text
        let parsed: Option<ApiResponse<T>> = serde_json::from_str(&body).ok();
        match parsed {
            Some(api) if status.is_success() && api.ok => Ok(api.result),
            Some(api) => Err(SendError::Api {
                status: status.as_u16(),
                description: api
                    .description
                    .unwrap_or_else(|| "request not ok".to_string()),
            }),
            None => Err(SendError::Api {
                status: status.as_u16(),
                description: body.chars().take(200).collect(),
            }),
        }
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), SendError> {
        for chunk in chunk_for_message(text) {
            let request = SendMessageRequest {
                chat_id,
                text: &chunk,
                parse_mode: "HTML",
            };
            let _: Option<serde_json::Value> = self.call("sendMessage", &request).await?;
        }
        debug!("Sent Telegram message to chat {chat_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, token: Option<&str>) -> TelegramClient {
        TelegramClient::new(&server.uri(), token.map(String::from), Duration::from_secs(5))
            .unwrap()
    }

    fn ok_message() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 1, "chat": { "id": 42 }, "text": "hi" }
        }))
    }

    #[tokio::test]
    async fn test_send_message_posts_html() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "42",
                "text": "<b>hi</b>",
                "parse_mode": "HTML"
            })))
            .respond_with(ok_message())
            .expect(1)
            .mount(&server)
            .await;

        client(&server, Some("TOKEN"))
            .send_message("42", "<b>hi</b>")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_token_is_not_configured() {
        let server = MockServer::start().await;
        let telegram = client(&server, None);
        assert!(!telegram.is_configured());
        let err = telegram.send_message("42", "hi").await.unwrap_err();
        assert!(matches!(err, SendError::NotConfigured));
    }

    #[tokio::test]
    async fn test_api_error_carries_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let err = client(&server, Some("TOKEN"))
            .send_message("999", "hi")
            .await
            .unwrap_err();
        match err {
            SendError::Api {
                status,
                description,
            } => {
                assert_eq!(status, 400);
                assert_eq!(description, "Bad Request: chat not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_long_text_is_split() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ok_message())
            .expect(2)
            .mount(&server)
            .await;

        let line = "x".repeat(100);
        let text = vec![line; 50].join("\n");
        client(&server, Some("TOKEN"))
            .send_message("42", &text)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_updates_parses_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {
                        "update_id": 100,
                        "message": {
                            "message_id": 5,
                            "chat": { "id": 42, "type": "private" },
                            "text": "/today"
                        }
                    },
                    { "update_id": 101, "edited_message": { "message_id": 6 } }
                ]
            })))
            .mount(&server)
            .await;

        let updates = client(&server, Some("TOKEN"))
            .get_updates(Some(100), 0)
            .await
            .unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].update_id, 100);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/today"));
        assert!(updates[1].message.is_none());
    }
}
