//! Paginated channel-history scans that stop at the first match.

use thiserror::Error;
use tracing::{debug, info};

use crate::slack_api_client::{SlackApiClient, SlackFile, SlackHistoryMessage};

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("failed to scan slack channel {channel}: {message}")]
    ScanFailed { channel: String, message: String },
    #[error("failed to download slack file {file}: {message}")]
    DownloadFailed { file: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identifies the bot-authored settlement notice inside a channel.
pub struct SettlementMessageCriteria {
    pub bot_id: String,
    pub author_name: String,
    pub field_title: String,
    pub field_value: String,
}

impl SettlementMessageCriteria {
    pub fn matches(&self, message: &SlackHistoryMessage) -> bool {
        let from_bot = message
            .bot_profile
            .as_ref()
            .map(|profile| profile.id == self.bot_id)
            .unwrap_or_else(|| message.bot_id.as_deref() == Some(self.bot_id.as_str()));
        if !from_bot {
            return false;
        }
        let Some(attachment) = message.attachments.first() else {
            return false;
        };
        if attachment.author_name.as_deref() != Some(self.author_name.as_str()) {
            return false;
        }
        attachment
            .fields
            .iter()
            .find(|field| field.title == self.field_title)
            .is_some_and(|field| field.value == self.field_value)
    }
}

#[derive(Clone)]
pub struct ChannelScanner {
    client: SlackApiClient,
}

impl ChannelScanner {
    pub fn new(client: SlackApiClient) -> Self {
        Self { client }
    }

    /// Returns the newest PDF file attached to `channel`, or `None` once history is exhausted.
    pub async fn find_first_pdf(
        &self,
        channel: &str,
        page_size: u32,
        cursor: Option<String>,
    ) -> Result<Option<SlackFile>, ScanError> {
        let found = self
            .find_first(channel, page_size, cursor, |message| {
                message.files.iter().find_map(|file| {
                    debug!(file = file.display_name(), mimetype = ?file.mimetype, "checking file");
                    (file.mimetype.as_deref() == Some(PDF_MIME_TYPE)).then(|| file.clone())
                })
            })
            .await?;
        match &found {
            Some(file) => info!(channel, file = file.display_name(), "pdf file detected"),
            None => info!(channel, "no pdf files found in channel"),
        }
        Ok(found)
    }

    /// Returns the newest message in `channel` matching `criteria`, scanning from `cursor`.
    pub async fn find_settlement_message(
        &self,
        channel: &str,
        page_size: u32,
        cursor: Option<String>,
        criteria: &SettlementMessageCriteria,
    ) -> Result<Option<SlackHistoryMessage>, ScanError> {
        let found = self
            .find_first(channel, page_size, cursor, |message| {
                criteria.matches(message).then(|| message.clone())
            })
            .await?;
        info!(channel, found = found.is_some(), "settlement message scan finished");
        Ok(found)
    }

    pub async fn download_file(&self, file: &SlackFile) -> Result<Vec<u8>, ScanError> {
        let download_failed = |message: String| ScanError::DownloadFailed {
            file: file.display_name().to_string(),
            message,
        };
        let url = file
            .download_url()
            .ok_or_else(|| download_failed("file has no private url".to_string()))?;
        let bytes = self
            .client
            .download_file(url)
            .await
            .map_err(|error| download_failed(format!("{error:#}")))?;
        debug!(file = file.display_name(), bytes = bytes.len(), "downloaded slack file");
        Ok(bytes)
    }

    async fn find_first<T, F>(
        &self,
        channel: &str,
        page_size: u32,
        mut cursor: Option<String>,
        mut pick: F,
    ) -> Result<Option<T>, ScanError>
    where
        F: FnMut(&SlackHistoryMessage) -> Option<T>,
    {
        loop {
            let page = self
                .client
                .conversations_history(channel, page_size, cursor.as_deref())
                .await
                .map_err(|error| ScanError::ScanFailed {
                    channel: channel.to_string(),
                    message: format!("{error:#}"),
                })?;
            debug!(channel, messages = page.messages.len(), "fetched history page");

            if let Some(found) = page.messages.iter().find_map(&mut pick) {
                return Ok(Some(found));
            }
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(None),
            }
        }
    }
}
