use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use sift_report::{ReportLayout, STRESS_TEST_ANCHOR, STRESS_TEST_DELIMITED, STRESS_TEST_WHITESPACE};
use sift_sheets::DEFAULT_SHEETS_API_BASE;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_page_size(value: &str) -> Result<u32, String> {
    let parsed = value
        .parse::<u32>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if !(1..=1_000).contains(&parsed) {
        return Err("value must be in range 1..=1000".to_string());
    }
    Ok(parsed)
}

fn parse_slash_command_name(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if !trimmed.starts_with('/') || trimmed.len() < 2 || trimmed.contains(char::is_whitespace) {
        return Err("command name must look like /name".to_string());
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliReportLayout {
    Whitespace,
    Delimited,
}

impl CliReportLayout {
    pub fn layout(self) -> &'static ReportLayout {
        match self {
            Self::Whitespace => &STRESS_TEST_WHITESPACE,
            Self::Delimited => &STRESS_TEST_DELIMITED,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sift",
    about = "Slack slash-command bridge that copies report figures and EOD settlements into Google Sheets",
    version
)]
pub struct Cli {
    #[arg(
        long = "slack-app-token",
        env = "SIFT_SLACK_APP_TOKEN",
        hide_env_values = true,
        help = "Slack Socket Mode app token (xapp-...)"
    )]
    pub slack_app_token: Option<String>,

    #[arg(
        long = "slack-bot-token",
        env = "SIFT_SLACK_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token for Web API reads and file downloads (xoxb-...)"
    )]
    pub slack_bot_token: Option<String>,

    #[arg(
        long = "slack-api-base",
        env = "SIFT_SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Slack Web API base URL"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "google-access-token",
        env = "SIFT_GOOGLE_ACCESS_TOKEN",
        hide_env_values = true,
        help = "OAuth access token with the spreadsheets scope"
    )]
    pub google_access_token: Option<String>,

    #[arg(
        long = "sheets-api-base",
        env = "SIFT_SHEETS_API_BASE",
        default_value = DEFAULT_SHEETS_API_BASE,
        help = "Google Sheets v4 API base URL"
    )]
    pub sheets_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "SIFT_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout applied to every Slack and Sheets HTTP request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "reconnect-delay-ms",
        env = "SIFT_RECONNECT_DELAY_MS",
        default_value_t = 5_000,
        value_parser = parse_positive_u64,
        help = "Delay before reopening the Socket Mode connection"
    )]
    pub reconnect_delay_ms: u64,

    #[arg(
        long = "stress-channel",
        env = "SIFT_STRESS_CHANNEL",
        default_value = "C03B8CE5XK6",
        help = "Channel scanned for the stress-test PDF"
    )]
    pub stress_channel: String,

    #[arg(
        long = "stress-page-size",
        env = "SIFT_STRESS_PAGE_SIZE",
        default_value_t = 100,
        value_parser = parse_page_size,
        help = "History page size used while scanning the stress-test channel"
    )]
    pub stress_page_size: u32,

    #[arg(
        long = "stress-spreadsheet-id",
        env = "SIFT_STRESS_SPREADSHEET_ID",
        default_value = "1lt4f0OB5sqE5aVLEM0gSsgf5Iy3tx2t5xVuxZRP-a6o",
        help = "Spreadsheet receiving the dated stress-test grids"
    )]
    pub stress_spreadsheet_id: String,

    #[arg(
        long = "stress-template-grid-id",
        env = "SIFT_STRESS_TEMPLATE_GRID_ID",
        help = "Grid copied for each dated grid (defaults to the first tab)"
    )]
    pub stress_template_grid_id: Option<i64>,

    #[arg(
        long = "report-layout",
        env = "SIFT_REPORT_LAYOUT",
        value_enum,
        default_value_t = CliReportLayout::Whitespace,
        help = "Token layout of the stress-test report table"
    )]
    pub report_layout: CliReportLayout,

    #[arg(
        long = "report-anchor",
        env = "SIFT_REPORT_ANCHOR",
        default_value = STRESS_TEST_ANCHOR,
        help = "Heading that starts the report table in the PDF text"
    )]
    pub report_anchor: String,

    #[arg(
        long = "settlement-channel",
        env = "SIFT_SETTLEMENT_CHANNEL",
        default_value = "C92T0N3DM",
        help = "Channel scanned for the EOD settlement message"
    )]
    pub settlement_channel: String,

    #[arg(
        long = "settlement-page-size",
        env = "SIFT_SETTLEMENT_PAGE_SIZE",
        default_value_t = 500,
        value_parser = parse_page_size,
        help = "History page size used while scanning the settlement channel"
    )]
    pub settlement_page_size: u32,

    #[arg(
        long = "settlement-spreadsheet-id",
        env = "SIFT_SETTLEMENT_SPREADSHEET_ID",
        default_value = "1m1dGJ0lsVkpMlw74P7yqfdbG1zvCZ0eBXOmLTah9Hsw",
        help = "Spreadsheet receiving settlement columns"
    )]
    pub settlement_spreadsheet_id: String,

    #[arg(
        long = "settlement-grid-id",
        env = "SIFT_SETTLEMENT_GRID_ID",
        default_value_t = 110_575_976,
        help = "Grid into which settlement columns are inserted"
    )]
    pub settlement_grid_id: i64,

    #[arg(
        long = "settlement-bot-id",
        env = "SIFT_SETTLEMENT_BOT_ID",
        default_value = "B02CV4E2Z9Q",
        help = "Bot id that posts the settlement status message"
    )]
    pub settlement_bot_id: String,

    #[arg(
        long = "settlement-author",
        env = "SIFT_SETTLEMENT_AUTHOR",
        default_value = "Settlement Status",
        help = "Attachment author name of the settlement status message"
    )]
    pub settlement_author: String,

    #[arg(
        long = "settlement-custodian",
        env = "SIFT_SETTLEMENT_CUSTODIAN",
        default_value = "rht",
        help = "Custodian field value the settlement message must carry"
    )]
    pub settlement_custodian: String,

    #[arg(
        long = "settlement-users-file",
        env = "SIFT_SETTLEMENT_USERS_FILE",
        default_value = "config/settlement-users.toml",
        help = "TOML file with a [users] table of Slack user id to display name"
    )]
    pub settlement_users_file: PathBuf,

    #[arg(
        long = "settlement-approver-links",
        env = "SIFT_SETTLEMENT_APPROVER_LINKS",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Link resolved approver names to their Slack profiles"
    )]
    pub settlement_approver_links: bool,

    #[arg(
        long = "command-stress-test",
        env = "SIFT_COMMAND_STRESS_TEST",
        default_value = "/update_stress_test_data",
        value_parser = parse_slash_command_name,
        help = "Slash command importing the report into today's 1 day grid"
    )]
    pub command_stress_test: String,

    #[arg(
        long = "command-stress-test-two-days",
        env = "SIFT_COMMAND_STRESS_TEST_TWO_DAYS",
        default_value = "/update_stress_test_data_2_days",
        value_parser = parse_slash_command_name,
        help = "Slash command importing the report into today's 1 day and 2 day grids"
    )]
    pub command_stress_test_two_days: String,

    #[arg(
        long = "command-eod-settlements",
        env = "SIFT_COMMAND_EOD_SETTLEMENTS",
        default_value = "/update_eod_settlements",
        value_parser = parse_slash_command_name,
        help = "Slash command appending the EOD settlement column"
    )]
    pub command_eod_settlements: String,
}
