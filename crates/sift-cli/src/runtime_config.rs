use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use sift_settlement::{UserDirectory, CUSTODIAN_FIELD};
use sift_slack_runtime::{
    CommandNames, SettlementMessageCriteria, SettlementSettings, SlackCommandRuntimeConfig,
    StressTestSettings,
};

use crate::cli_args::Cli;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettlementUsersFile {
    #[serde(default)]
    users: UserDirectory,
}

/// Reads the `[users]` table of a settlement users file.
pub(crate) fn load_settlement_users(path: &Path) -> Result<UserDirectory> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settlement users file {}", path.display()))?;
    let parsed = toml::from_str::<SettlementUsersFile>(&raw)
        .with_context(|| format!("failed to parse settlement users file {}", path.display()))?;
    Ok(parsed.users)
}

fn required_secret(value: Option<&str>, flag: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("{flag} is required"))
}

pub(crate) fn build_runtime_config(
    cli: &Cli,
    users: UserDirectory,
) -> Result<SlackCommandRuntimeConfig> {
    let app_token = required_secret(cli.slack_app_token.as_deref(), "--slack-app-token")?;
    let bot_token = required_secret(cli.slack_bot_token.as_deref(), "--slack-bot-token")?;
    let google_access_token =
        required_secret(cli.google_access_token.as_deref(), "--google-access-token")?;

    Ok(SlackCommandRuntimeConfig {
        api_base: cli.slack_api_base.clone(),
        app_token,
        bot_token,
        request_timeout_ms: cli.request_timeout_ms,
        reconnect_delay: Duration::from_millis(cli.reconnect_delay_ms),
        sheets_api_base: cli.sheets_api_base.clone(),
        google_access_token,
        commands: CommandNames {
            stress_test: cli.command_stress_test.clone(),
            stress_test_two_days: cli.command_stress_test_two_days.clone(),
            eod_settlements: cli.command_eod_settlements.clone(),
        },
        stress: StressTestSettings {
            channel_id: cli.stress_channel.clone(),
            page_size: cli.stress_page_size,
            spreadsheet_id: cli.stress_spreadsheet_id.clone(),
            template_grid_id: cli.stress_template_grid_id,
            layout: cli.report_layout.layout(),
            anchor: cli.report_anchor.clone(),
        },
        settlement: SettlementSettings {
            channel_id: cli.settlement_channel.clone(),
            page_size: cli.settlement_page_size,
            spreadsheet_id: cli.settlement_spreadsheet_id.clone(),
            grid_id: cli.settlement_grid_id,
            criteria: SettlementMessageCriteria {
                bot_id: cli.settlement_bot_id.clone(),
                author_name: cli.settlement_author.clone(),
                field_title: CUSTODIAN_FIELD.to_string(),
                field_value: cli.settlement_custodian.clone(),
            },
            users: Arc::new(users),
            approver_links: cli.settlement_approver_links,
        },
    })
}
