//! Slack Web API client.
//!
//! Provides methods for posting and updating messages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};

use super::error::SlackError;
use super::types::{ChatMessage, MessageResponse};
use crate::config::SlackConfig;

/// Chat operations the handlers depend on.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Post a new message.
    async fn post_message(&self, message: &ChatMessage) -> Result<MessageResponse, SlackError>;

    /// Replace the message at `message.ts` in `message.channel`.
    async fn update_message(&self, message: &ChatMessage) -> Result<MessageResponse, SlackError>;
}

/// Slack API client for sending and updating messages.
#[derive(Clone)]
pub struct SlackClient {
    /// HTTP client.
    client: Client,
    /// Bot token for authentication.
    bot_token: SecretString,
    /// Web API base URL, without trailing slash.
    api_base: String,
}

impl std::fmt::Debug for SlackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackClient")
            .field("bot_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl SlackClient {
    /// Create a new Slack client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `SlackError::Config` if the HTTP client cannot be built.
    pub fn new(config: &SlackConfig, timeout: Duration) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SlackError::Config(e.to_string()))?;

        Ok(Self {
            client,
            bot_token: config.bot_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    async fn call(&self, method: &str, message: &ChatMessage) -> Result<MessageResponse, SlackError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .json(message)
            .send()
            .await
            .map_err(|e| SlackError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Response(format!("{method} returned {status}: {body}")));
        }

        let result: MessageResponse = response
            .json()
            .await
            .map_err(|e| SlackError::Response(e.to_string()))?;

        if !result.ok {
            error!(
                method,
                error = ?result.error,
                "Slack API error"
            );
            return Err(SlackError::Api(
                result.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        Ok(result)
    }
}

#[async_trait]
impl ChatApi for SlackClient {
    #[instrument(skip(self, message), fields(channel = %message.channel))]
    async fn post_message(&self, message: &ChatMessage) -> Result<MessageResponse, SlackError> {
        let result = self.call("chat.postMessage", message).await?;

        debug!(
            ts = ?result.ts,
            channel = ?result.channel,
            "Message posted to Slack"
        );

        Ok(result)
    }

    #[instrument(skip(self, message), fields(channel = %message.channel, ts = ?message.ts))]
    async fn update_message(&self, message: &ChatMessage) -> Result<MessageResponse, SlackError> {
        if message.ts.is_none() {
            return Err(SlackError::InvalidPayload(
                "chat.update requires a message ts".to_string(),
            ));
        }

        let result = self.call("chat.update", message).await?;

        debug!(ts = ?result.ts, "Message updated in Slack");

        Ok(result)
    }
}
