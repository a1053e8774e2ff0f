//! Slack Socket Mode runtime that receives slash commands and runs the command flows.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sift_core::{current_unix_timestamp_ms, local_today, truncate_for_slack};
use sift_report::PdfExtractTextSource;
use sift_sheets::SheetsApiClient;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

use crate::command_flows::{
    run_settlement_update, run_stress_test_update, CommandContext, CommandResponder,
    SettlementSettings, StressTestSettings,
};
use crate::slack_api_client::SlackApiClient;

mod slack_command_helpers;

pub use slack_command_helpers::{CommandNames, SiftCommand};
use slack_command_helpers::sift_command_usage;

const SLACK_REPLY_MAX_CHARS: usize = 3_000;

#[derive(Debug, Clone)]
/// Runtime configuration for the Slack command bridge.
pub struct SlackCommandRuntimeConfig {
    pub api_base: String,
    pub app_token: String,
    pub bot_token: String,
    pub request_timeout_ms: u64,
    pub reconnect_delay: Duration,
    pub sheets_api_base: String,
    pub google_access_token: String,
    pub commands: CommandNames,
    pub stress: StressTestSettings,
    pub settlement: SettlementSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct SlackSocketEnvelope {
    #[serde(default)]
    envelope_id: String,
    #[serde(rename = "type")]
    envelope_type: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
/// Fields of a `slash_commands` envelope payload the runtime reads.
pub struct SlashCommandPayload {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionExit {
    Shutdown,
    Reconnect,
}

/// Posts ephemeral replies to a slash command's `response_url`.
struct ResponseUrlResponder {
    client: SlackApiClient,
    response_url: String,
}

#[async_trait]
impl CommandResponder for ResponseUrlResponder {
    async fn respond(&self, text: &str) -> Result<()> {
        let text = truncate_for_slack(text, SLACK_REPLY_MAX_CHARS);
        self.client
            .post_command_response(&self.response_url, &text, true)
            .await
    }
}

pub async fn run_slack_command_bridge(config: SlackCommandRuntimeConfig) -> Result<()> {
    let runtime = SlackCommandRuntime::new(config)?;
    runtime.run().await
}

struct SlackCommandRuntime {
    config: SlackCommandRuntimeConfig,
    context: Arc<CommandContext>,
}

impl SlackCommandRuntime {
    fn new(config: SlackCommandRuntimeConfig) -> Result<Self> {
        let context = Arc::new(build_command_context(&config)?);
        Ok(Self { config, context })
    }

    async fn run(&self) -> Result<()> {
        loop {
            let socket_url = match self.context.slack_client().open_socket_connection().await {
                Ok(url) => url,
                Err(error) => {
                    warn!(error = %format!("{error:#}"), "failed to open slack socket connection");
                    if self.wait_for_reconnect().await == SessionExit::Shutdown {
                        return Ok(());
                    }
                    continue;
                }
            };

            info!("slack socket connected");
            match self.run_socket_session(&socket_url).await {
                Ok(SessionExit::Shutdown) => {
                    info!("slack bridge shutdown requested");
                    return Ok(());
                }
                Ok(SessionExit::Reconnect) => {}
                Err(error) => {
                    error!(error = %format!("{error:#}"), "slack socket session error");
                }
            }

            if self.wait_for_reconnect().await == SessionExit::Shutdown {
                return Ok(());
            }
        }
    }

    async fn wait_for_reconnect(&self) -> SessionExit {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("slack bridge shutdown requested");
                SessionExit::Shutdown
            }
            _ = tokio::time::sleep(self.config.reconnect_delay) => SessionExit::Reconnect,
        }
    }

    async fn run_socket_session(&self, socket_url: &str) -> Result<SessionExit> {
        let (stream, _response) = connect_async(socket_url)
            .await
            .context("failed to connect slack socket mode websocket")?;
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    return Ok(SessionExit::Shutdown);
                }
                maybe_message = source.next() => {
                    let Some(message_result) = maybe_message else {
                        info!("slack socket stream closed");
                        return Ok(SessionExit::Reconnect);
                    };
                    let message = message_result.context("failed reading slack websocket message")?;
                    let Some(envelope) = parse_socket_envelope(message)? else {
                        continue;
                    };
                    if !envelope.envelope_id.is_empty() {
                        ack_envelope(&mut sink, &envelope.envelope_id).await?;
                    }
                    if !self.handle_envelope(envelope) {
                        return Ok(SessionExit::Reconnect);
                    }
                }
            }
        }
    }

    /// Returns false when the envelope ends the current socket session.
    fn handle_envelope(&self, envelope: SlackSocketEnvelope) -> bool {
        match envelope.envelope_type.as_str() {
            "hello" => debug!("slack socket hello received"),
            "disconnect" => {
                info!(
                    reason = envelope.reason.as_deref().unwrap_or("unspecified"),
                    "slack requested socket disconnect"
                );
                return false;
            }
            "slash_commands" => match parse_slash_command_payload(envelope.payload) {
                Ok(payload) => self.spawn_command(payload),
                Err(error) => warn!(error = %format!("{error:#}"), "ignoring malformed slash command"),
            },
            other => debug!(envelope_type = other, "ignoring slack socket envelope"),
        }
        true
    }

    fn spawn_command(&self, payload: SlashCommandPayload) {
        info!(
            command = payload.command.as_str(),
            user_id = payload.user_id.as_str(),
            channel_id = payload.channel_id.as_str(),
            "slash command received"
        );
        let context = Arc::clone(&self.context);
        let names = self.config.commands.clone();
        tokio::spawn(async move {
            let started_unix_ms = current_unix_timestamp_ms();
            let responder = ResponseUrlResponder {
                client: context.slack_client().clone(),
                response_url: payload.response_url.clone(),
            };
            if let Err(error) =
                handle_slash_command(&context, &names, &payload, local_today(), &responder).await
            {
                warn!(
                    command = payload.command.as_str(),
                    error = %format!("{error:#}"),
                    "failed to deliver slash command reply"
                );
            }
            info!(
                command = payload.command.as_str(),
                elapsed_ms = current_unix_timestamp_ms().saturating_sub(started_unix_ms),
                "slash command finished"
            );
        });
    }
}

/// Builds the shared command context from runtime configuration.
pub fn build_command_context(config: &SlackCommandRuntimeConfig) -> Result<CommandContext> {
    let slack = SlackApiClient::new(
        config.api_base.clone(),
        config.app_token.clone(),
        config.bot_token.clone(),
        config.request_timeout_ms,
    )?;
    let sheets = SheetsApiClient::new(
        config.sheets_api_base.clone(),
        config.google_access_token.clone(),
        config.request_timeout_ms,
    )
    .context("failed to create sheets api client")?;
    Ok(CommandContext::new(
        slack,
        sheets,
        Arc::new(PdfExtractTextSource),
        config.stress.clone(),
        config.settlement.clone(),
    ))
}

/// Runs one slash command to completion and sends its final reply through `responder`.
///
/// Flow failures are reported to the user as `Error occurred: <error>`; the
/// returned error only covers reply delivery.
pub async fn handle_slash_command(
    ctx: &CommandContext,
    names: &CommandNames,
    payload: &SlashCommandPayload,
    today: NaiveDate,
    responder: &dyn CommandResponder,
) -> Result<()> {
    let reply = match SiftCommand::parse(&payload.command, names) {
        SiftCommand::StressTest { day_spans } => {
            match run_stress_test_update(ctx, &day_spans, today).await {
                Ok(outcome) => outcome.render_reply(),
                Err(error) => {
                    error!(command = payload.command.as_str(), error = %error, "stress test update failed");
                    format!("Error occurred: {error}")
                }
            }
        }
        SiftCommand::EodSettlements => {
            match run_settlement_update(ctx, &payload.user_id, today, responder).await {
                Ok(outcome) => outcome.render_reply().to_string(),
                Err(error) => {
                    error!(command = payload.command.as_str(), error = %error, "settlement update failed");
                    format!("Error occurred: {error}")
                }
            }
        }
        SiftCommand::Unknown { command } => {
            warn!(command = command.as_str(), "unknown slash command");
            sift_command_usage(names)
        }
    };
    responder.respond(&reply).await
}

async fn ack_envelope<S>(sink: &mut S, envelope_id: &str) -> Result<()>
where
    S: futures_util::Sink<WsMessage> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let ack = json!({ "envelope_id": envelope_id }).to_string();
    sink.send(WsMessage::Text(ack.into()))
        .await
        .context("failed to send slack socket ack")
}

fn parse_socket_envelope(message: WsMessage) -> Result<Option<SlackSocketEnvelope>> {
    match message {
        WsMessage::Text(text) => {
            let envelope = serde_json::from_str::<SlackSocketEnvelope>(&text)
                .context("failed to parse slack socket envelope")?;
            Ok(Some(envelope))
        }
        WsMessage::Binary(bytes) => {
            let text =
                String::from_utf8(bytes.to_vec()).context("invalid utf-8 slack socket payload")?;
            let envelope = serde_json::from_str::<SlackSocketEnvelope>(&text)
                .context("failed to parse slack socket envelope")?;
            Ok(Some(envelope))
        }
        WsMessage::Ping(_) | WsMessage::Pong(_) => Ok(None),
        WsMessage::Close(_) => Ok(None),
        WsMessage::Frame(_) => Ok(None),
    }
}

fn parse_slash_command_payload(payload: Value) -> Result<SlashCommandPayload> {
    let payload = serde_json::from_value::<SlashCommandPayload>(payload)
        .context("failed to parse slash command payload")?;
    anyhow::ensure!(
        !payload.response_url.trim().is_empty(),
        "slash command payload has no response_url"
    );
    Ok(payload)
}
