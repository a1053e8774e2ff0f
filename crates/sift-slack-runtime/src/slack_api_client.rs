//! Slack Web API client helpers used by channel scans and command replies.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sift_core::truncate_for_error;
use sift_settlement::{deserialize_null_as_empty, SettlementField};

#[derive(Debug, Clone, Deserialize)]
struct SlackOpenSocketResponse {
    ok: bool,
    url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SlackResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackHistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<SlackHistoryMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<SlackResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
/// File reference attached to a channel message.
pub struct SlackFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub url_private: Option<String>,
    #[serde(default)]
    pub url_private_download: Option<String>,
}

impl SlackFile {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }

    /// Authenticated download URL, preferring `url_private`.
    pub fn download_url(&self) -> Option<&str> {
        self.url_private
            .as_deref()
            .or(self.url_private_download.as_deref())
            .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SlackBotProfile {
    #[serde(default, deserialize_with = "deserialize_null_as_empty")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
/// Legacy structured attachment posted by integrations and bots.
pub struct SlackMessageAttachment {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<SettlementField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SlackHistoryMessage {
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub bot_profile: Option<SlackBotProfile>,
    #[serde(default)]
    pub files: Vec<SlackFile>,
    #[serde(default)]
    pub attachments: Vec<SlackMessageAttachment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// One page of `conversations.history`, newest message first.
pub struct HistoryPage {
    pub messages: Vec<SlackHistoryMessage>,
    /// Cursor for the next page; `None` on the last page.
    pub next_cursor: Option<String>,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    app_token: String,
    bot_token: String,
}

impl SlackApiClient {
    pub fn new(
        api_base: String,
        app_token: String,
        bot_token: String,
        request_timeout_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("sift-slack-bridge"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            app_token: app_token.trim().to_string(),
            bot_token: bot_token.trim().to_string(),
        })
    }

    pub async fn open_socket_connection(&self) -> Result<String> {
        let response: SlackOpenSocketResponse = self
            .request_json(
                "apps.connections.open",
                self.http
                    .post(format!("{}/apps.connections.open", self.api_base))
                    .bearer_auth(&self.app_token),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack apps.connections.open failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }
        response
            .url
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| anyhow!("slack apps.connections.open did not return url"))
    }

    /// Fetches one page of channel history starting at `cursor`.
    pub async fn conversations_history(
        &self,
        channel: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<HistoryPage> {
        let mut query = vec![
            ("channel", channel.to_string()),
            ("limit", limit.max(1).to_string()),
        ];
        if let Some(cursor) = cursor.map(str::trim).filter(|value| !value.is_empty()) {
            query.push(("cursor", cursor.to_string()));
        }
        let response: SlackHistoryResponse = self
            .request_json(
                "conversations.history",
                self.http
                    .get(format!("{}/conversations.history", self.api_base))
                    .query(&query)
                    .bearer_auth(&self.bot_token),
            )
            .await?;
        if !response.ok {
            bail!(
                "slack conversations.history failed: {}",
                response
                    .error
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        let next_cursor = if response.has_more {
            response
                .response_metadata
                .and_then(|metadata| metadata.next_cursor)
                .filter(|cursor| !cursor.trim().is_empty())
        } else {
            None
        };
        Ok(HistoryPage {
            messages: response.messages,
            next_cursor,
        })
    }

    pub async fn download_file(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bot_token)
            .send()
            .await
            .context("slack api file download request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!(
                "slack api file download failed with status {}",
                status.as_u16()
            );
        }
        Ok(response
            .bytes()
            .await
            .context("failed to read slack file download body")?
            .to_vec())
    }

    /// Posts a reply to a slash command's `response_url`.
    pub async fn post_command_response(
        &self,
        response_url: &str,
        text: &str,
        ephemeral: bool,
    ) -> Result<()> {
        let payload = json!({
            "response_type": if ephemeral { "ephemeral" } else { "in_channel" },
            "text": text,
        });
        let response = self
            .http
            .post(response_url)
            .json(&payload)
            .send()
            .await
            .context("slack command response request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "slack command response failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        Ok(())
    }

    async fn request_json<T>(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .with_context(|| format!("slack api {operation} request failed"))?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .with_context(|| format!("failed to decode slack {operation}"));
        }
        let body = response.text().await.unwrap_or_default();
        bail!(
            "slack api {operation} failed with status {}: {}",
            status.as_u16(),
            truncate_for_error(&body, 800)
        );
    }
}
