//! Telegram Bot API notification channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ChannelError;
use crate::NotifyChannel;

/// Environment variable for the bot token.
const ENV_TELEGRAM_API_TOKEN: &str = "TELEGRAM_API_TOKEN";

/// Environment variable for the chat receiving notifications.
const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Public Bot API endpoint.
const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Request timeout for Bot API calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Longest response excerpt written to the debug log.
const LOG_BODY_LIMIT: usize = 1000;

/// Text formatting dialect for `sendMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    MarkdownV2,
}

/// Telegram Bot API channel.
///
/// Notifications go to the configured chat with MarkdownV2 formatting;
/// [`TelegramChannel::send_message`] can target any chat.
pub struct TelegramChannel {
    api_token: Option<String>,
    chat_id: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let api_token = std::env::var(ENV_TELEGRAM_API_TOKEN).ok();
        let chat_id = std::env::var(ENV_TELEGRAM_CHAT_ID).ok();

        if api_token.is_none() {
            debug!("Telegram notifications disabled (TELEGRAM_API_TOKEN not set)");
        } else if chat_id.is_none() {
            debug!("Telegram notifications disabled (TELEGRAM_CHAT_ID not set)");
        }

        Self::new(api_token, chat_id)
    }

    /// Create a Telegram channel with explicit credentials.
    #[must_use]
    pub fn new(api_token: Option<String>, chat_id: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!(
                    channel = "telegram",
                    error = %e,
                    "Failed to build HTTP client, falling back to one without a timeout"
                );
                reqwest::Client::new()
            });

        Self {
            api_token,
            chat_id,
            api_base: DEFAULT_API_BASE.to_string(),
            client,
        }
    }

    /// Point the channel at a different Bot API server.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Call a Bot API method and return its `result`.
    pub async fn call<P: Serialize + ?Sized + Sync>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<Value, ChannelError> {
        let token = self
            .api_token
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_TELEGRAM_API_TOKEN.to_string()))?;
        let url = format!(
            "{}/bot{token}/{method}",
            self.api_base.trim_end_matches('/')
        );

        info!(channel = "telegram", method, "Calling Telegram API method");

        // The token is part of the URL; keep it out of error messages.
        let response = self
            .client
            .post(&url)
            .json(params)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status();
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        debug!(
            channel = "telegram",
            method,
            status = %status,
            body = %truncate(&body, LOG_BODY_LIMIT),
            "Telegram API response"
        );

        let parsed: Option<TelegramResponse> = serde_json::from_str(&body).ok();

        let retry_after = parsed
            .as_ref()
            .and_then(|r| r.parameters.as_ref())
            .and_then(|p| p.retry_after);
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS || retry_after.is_some() {
            let retry_after_secs = retry_after.unwrap_or(1);
            warn!(channel = "telegram", method, retry_after_secs, "Rate limited");
            return Err(ChannelError::RateLimited { retry_after_secs });
        }

        match parsed {
            Some(r) if status.is_success() && r.ok => Ok(r.result.unwrap_or(Value::Null)),
            Some(r) => Err(ChannelError::Api {
                method: method.to_string(),
                status: status.as_u16(),
                description: r
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
            None => Err(ChannelError::Api {
                method: method.to_string(),
                status: status.as_u16(),
                description: truncate(&body, LOG_BODY_LIMIT).to_string(),
            }),
        }
    }

    /// Send a text message to an arbitrary chat.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<(), ChannelError> {
        let request = SendMessage {
            chat_id,
            text,
            parse_mode,
        };
        self.call("sendMessage", &request).await?;
        Ok(())
    }

    /// Register the URL Telegram should deliver message updates to.
    pub async fn set_webhook(&self, url: &str) -> Result<(), ChannelError> {
        let request = SetWebhook {
            url,
            allowed_updates: &["message"],
        };
        self.call("setWebhook", &request).await?;
        info!(channel = "telegram", "Webhook registered");
        Ok(())
    }
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn enabled(&self) -> bool {
        self.api_token.is_some() && self.chat_id.is_some()
    }

    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        let chat_id = self
            .chat_id
            .as_deref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_TELEGRAM_CHAT_ID.to_string()))?;

        self.send_message(chat_id, text, Some(ParseMode::MarkdownV2))
            .await
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// =============================================================================
// Bot API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
}

#[derive(Debug, Serialize)]
struct SetWebhook<'a> {
    url: &'a str,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    #[serde(default)]
    retry_after: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel(server: &MockServer) -> TelegramChannel {
        TelegramChannel::new(Some("123:abc".to_string()), Some("-100".to_string()))
            .with_api_base(server.uri())
    }

    #[tokio::test]
    async fn test_send_uses_markdown_v2() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({
                "chat_id": "-100",
                "text": r"hello \. world",
                "parse_mode": "MarkdownV2",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        channel(&server).send(r"hello \. world").await.unwrap();
    }

    #[tokio::test]
    async fn test_plain_message_omits_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(json!({"chat_id": "42", "text": "hi"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": {}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        channel(&server)
            .send_message("42", "hi", None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_set_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/setWebhook"))
            .and(body_json(json!({
                "url": "https://bot.example.com/telegram-webhook",
                "allowed_updates": ["message"],
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": true})),
            )
            .expect(1)
            .mount(&server)
            .await;

        channel(&server)
            .set_webhook("https://bot.example.com/telegram-webhook")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: can't parse entities",
            })))
            .mount(&server)
            .await;

        let err = channel(&server).send("bad.").await.unwrap_err();
        match err {
            ChannelError::Api {
                method,
                status,
                description,
            } => {
                assert_eq!(method, "sendMessage");
                assert_eq!(status, 400);
                assert!(description.contains("can't parse entities"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 7",
                "parameters": {"retry_after": 7},
            })))
            .mount(&server)
            .await;

        let err = channel(&server).send("x").await.unwrap_err();
        assert!(matches!(
            err,
            ChannelError::RateLimited {
                retry_after_secs: 7
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_chat_is_not_configured() {
        let ch = TelegramChannel::new(Some("t".to_string()), None);
        assert!(!ch.enabled());
        assert!(matches!(
            ch.send("x").await,
            Err(ChannelError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_token_is_not_configured() {
        let ch = TelegramChannel::new(None, Some("1".to_string()));
        assert!(!ch.enabled());
        assert!(matches!(
            ch.send_message("1", "x", None).await,
            Err(ChannelError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("abc", 10), "abc");
    }
}
