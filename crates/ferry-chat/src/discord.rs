//! Discord channel renderer: one message per page, edited while live.

use std::time::Duration;

use async_trait::async_trait;
use ferry_paginate::truncate_to_page;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use serde_json::json;

use crate::{
    PageHandle, PageSink, SinkError, DEFAULT_DISCORD_API_BASE, DISCORD_MAX_MESSAGE_CHARS,
    DISCORD_REQUEST_TIMEOUT_MS,
};

const CODE_FENCE: &str = "```";

#[derive(Debug, Clone)]
pub struct DiscordSinkConfig {
    pub api_base: String,
    pub bot_token: String,
    pub channel_id: String,
    pub request_timeout_ms: u64,
    /// Wrap pages in a code block when the fence still fits.
    pub code_block: bool,
}

impl Default for DiscordSinkConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_DISCORD_API_BASE.to_string(),
            bot_token: String::new(),
            channel_id: String::new(),
            request_timeout_ms: DISCORD_REQUEST_TIMEOUT_MS,
            code_block: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DiscordMessageResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DiscordPageSink {
    http: reqwest::Client,
    messages_url: String,
    code_block: bool,
}

impl DiscordPageSink {
    pub fn new(config: DiscordSinkConfig) -> Result<Self, SinkError> {
        let token = config.bot_token.trim();
        if token.is_empty() {
            return Err(SinkError::MissingCredential);
        }
        let channel_id = config.channel_id.trim();
        if channel_id.is_empty() || !channel_id.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(SinkError::InvalidConfig(format!(
                "discord channel id '{}' must be numeric",
                config.channel_id
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("DiscordBot (ferry, 0.1)"));
        let mut authorization = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|error| SinkError::InvalidConfig(format!("invalid bot token: {error}")))?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()?;

        Ok(Self {
            http,
            messages_url: format!(
                "{}/channels/{}/messages",
                config.api_base.trim_end_matches('/'),
                channel_id
            ),
            code_block: config.code_block,
        })
    }

    fn render(&self, content: &str) -> String {
        let fenced_len = content.chars().count() + 2 * CODE_FENCE.len() + 2;
        if self.code_block && fenced_len <= DISCORD_MAX_MESSAGE_CHARS && !content.contains(CODE_FENCE)
        {
            return format!("{CODE_FENCE}\n{content}\n{CODE_FENCE}");
        }
        truncate_to_page(content, DISCORD_MAX_MESSAGE_CHARS)
    }
}

#[async_trait]
impl PageSink for DiscordPageSink {
    async fn send_page(&self, content: &str) -> Result<PageHandle, SinkError> {
        let response = self
            .http
            .post(&self.messages_url)
            .json(&json!({ "content": self.render(content) }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::RequestFailed {
                operation: "send",
                status: status.as_u16(),
            });
        }
        let message = response.json::<DiscordMessageResponse>().await?;
        message
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .map(PageHandle)
            .ok_or(SinkError::MissingMessageId)
    }

    async fn edit_page(&self, handle: &PageHandle, content: &str) -> Result<(), SinkError> {
        let response = self
            .http
            .patch(format!("{}/{}", self.messages_url, handle.as_str()))
            .json(&json!({ "content": self.render(content) }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::RequestFailed {
                operation: "edit",
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn max_content_chars(&self) -> usize {
        DISCORD_MAX_MESSAGE_CHARS
    }
}
