//! Slack command runtime for Sift.
//!
//! Hosts the Socket Mode loop that receives slash commands, the Slack Web API
//! client and channel scanner they read through, and the two command flows:
//! stress-test report import and EOD settlement append.

pub mod channel_scanner;
pub mod command_flows;
pub mod slack_api_client;
pub mod slack_runtime;

pub use channel_scanner::{ChannelScanner, ScanError, SettlementMessageCriteria, PDF_MIME_TYPE};
pub use command_flows::{
    dated_grid_name, run_settlement_update, run_stress_test_update, CommandContext, CommandError,
    CommandResponder, GridOutcome, SettlementOutcome, SettlementSettings, StressTestOutcome,
    StressTestSettings, PERMISSION_DENIED_REPLY,
};
pub use slack_api_client::{
    HistoryPage, SlackApiClient, SlackBotProfile, SlackFile, SlackHistoryMessage,
    SlackMessageAttachment,
};
pub use slack_runtime::{
    build_command_context, handle_slash_command, run_slack_command_bridge, CommandNames,
    SiftCommand, SlackCommandRuntimeConfig, SlashCommandPayload,
};
