//! Slack adapter

pub mod rtm;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::BotError;
use crate::domain::entities::{Attachment, Reply};
use crate::domain::traits::ChatPoster;

pub use rtm::{RtmEvent, RtmListener};

/// `rtm.connect` errors that mean the token itself is unusable
const AUTH_ERRORS: &[&str] = &["invalid_auth", "not_authed", "account_inactive", "token_revoked"];

/// Websocket endpoint handed out by `rtm.connect`
#[derive(Debug, Clone)]
pub struct RtmConnection {
    pub url: String,
    pub self_id: Option<String>,
}

/// Slack Web API client
pub struct SlackClient {
    token: String,
    client: Client,
    api_base: String,
    username: String,
    icon_emoji: String,
}

impl SlackClient {
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            username: "travis-bot".to_string(),
            icon_emoji: ":construction_worker:".to_string(),
        }
    }

    /// Identity shown on posted replies
    pub fn with_identity(mut self, username: impl Into<String>, icon_emoji: impl Into<String>) -> Self {
        self.username = username.into();
        self.icon_emoji = icon_emoji.into();
        self
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Ask Slack for a fresh RTM websocket URL
    pub async fn rtm_connect(&self) -> Result<RtmConnection, BotError> {
        #[derive(Deserialize)]
        struct Response {
            ok: bool,
            url: Option<String>,
            #[serde(rename = "self")]
            identity: Option<Identity>,
            error: Option<String>,
        }

        #[derive(Deserialize)]
        struct Identity {
            id: String,
        }

        let response = self.client
            .post(self.api_url("rtm.connect"))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| BotError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Connection(format!("Slack API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        if !data.ok {
            let error = data.error.unwrap_or_else(|| "unknown error".to_string());
            if AUTH_ERRORS.contains(&error.as_str()) {
                return Err(BotError::Auth(error));
            }
            return Err(BotError::Connection(format!("rtm.connect failed: {}", error)));
        }

        let url = data
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| BotError::Parse("rtm.connect did not return url".to_string()))?;

        Ok(RtmConnection {
            url,
            self_id: data.identity.map(|i| i.id),
        })
    }

    /// Post a message with attachments via `chat.postMessage`
    pub async fn post_message(&self, channel: &str, reply: &Reply) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct PostMessageRequest<'a> {
            channel: &'a str,
            text: &'a str,
            attachments: &'a [Attachment],
            username: &'a str,
            icon_emoji: &'a str,
            mrkdwn: bool,
        }

        #[derive(Deserialize)]
        struct Response {
            ok: bool,
            ts: Option<String>,
            error: Option<String>,
        }

        let request = PostMessageRequest {
            channel,
            text: &reply.text,
            attachments: &reply.attachments,
            username: &self.username,
            icon_emoji: &self.icon_emoji,
            mrkdwn: true,
        };

        let response = self.client
            .post(self.api_url("chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Post(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Post(format!("Slack API error: {}", response.status())));
        }

        let data: Response = response
            .json()
            .await
            .map_err(|e| BotError::Post(e.to_string()))?;

        if !data.ok {
            return Err(BotError::Post(data.error.unwrap_or_else(|| "unknown error".to_string())));
        }

        Ok(data.ts.unwrap_or_default())
    }
}

#[async_trait]
impl ChatPoster for SlackClient {
    async fn post_reply(&self, channel: &str, reply: &Reply) -> Result<String, BotError> {
        tracing::debug!("Sending to {} (color: {:?}): {:?}", channel, reply.color(), reply);

        match self.post_message(channel, reply).await {
            Ok(ts) => Ok(ts),
            Err(e) => {
                tracing::error!("Failed to post message: {}", e);
                Err(e)
            }
        }
    }
}
