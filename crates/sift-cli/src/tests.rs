use std::path::Path;

use clap::Parser;
use sift_report::STRESS_TEST_ANCHOR;
use sift_settlement::UserDirectory;
use tempfile::tempdir;

use crate::cli_args::{Cli, CliReportLayout};
use crate::runtime_config::{build_runtime_config, load_settlement_users};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("sift").chain(args.iter().copied())).expect("parse cli")
}

fn with_tokens(extra: &[&str]) -> Cli {
    let mut args = vec![
        "--slack-app-token",
        "xapp-1",
        "--slack-bot-token",
        "xoxb-1",
        "--google-access-token",
        "ya29.1",
    ];
    args.extend_from_slice(extra);
    parse(&args)
}

#[test]
fn unit_cli_defaults_target_the_production_channels_and_books() {
    let cli = with_tokens(&[]);
    assert_eq!(cli.stress_channel, "C03B8CE5XK6");
    assert_eq!(cli.stress_page_size, 100);
    assert_eq!(cli.settlement_channel, "C92T0N3DM");
    assert_eq!(cli.settlement_page_size, 500);
    assert_eq!(cli.settlement_grid_id, 110_575_976);
    assert_eq!(cli.settlement_bot_id, "B02CV4E2Z9Q");
    assert_eq!(cli.report_layout, CliReportLayout::Whitespace);
    assert_eq!(cli.report_anchor, STRESS_TEST_ANCHOR);
    assert_eq!(cli.command_stress_test, "/update_stress_test_data");
    assert!(cli.settlement_approver_links);
    assert!(cli.stress_template_grid_id.is_none());
}

#[test]
fn unit_cli_rejects_out_of_range_page_size() {
    let error = Cli::try_parse_from(["sift", "--stress-page-size", "0"]).expect_err("zero");
    assert!(error.to_string().contains("1..=1000"));
}

#[test]
fn unit_cli_rejects_command_names_without_slash() {
    let error = Cli::try_parse_from(["sift", "--command-eod-settlements", "update_eod"])
        .expect_err("bad command name");
    assert!(error.to_string().contains("/name"));
}

#[test]
fn functional_load_settlement_users_reads_users_table() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("users.toml");
    std::fs::write(
        &path,
        "[users]\nU020LSUKYJF = \"Albi Mema\"\nU011SEVFY05 = \"Tanner Freeman\"\n",
    )
    .expect("write users");

    let users = load_settlement_users(&path).expect("load users");
    assert_eq!(users.len(), 2);
    assert_eq!(users.display_name("U011SEVFY05"), Some("Tanner Freeman"));
    assert!(!users.contains("U999"));
}

#[test]
fn regression_settlement_users_file_rejects_unknown_sections() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("users.toml");
    std::fs::write(&path, "[user]\nU1 = \"Typo Section\"\n").expect("write users");

    let error = load_settlement_users(&path).expect_err("unknown section");
    assert!(format!("{error:#}").contains("failed to parse settlement users file"));
}

#[test]
fn functional_shipped_settlement_users_file_parses() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/settlement-users.toml");
    let users = load_settlement_users(&path).expect("load shipped users");
    assert_eq!(users.len(), 6);
    assert_eq!(users.display_name("U020LSUKYJF"), Some("Albi Mema"));
}

#[test]
fn functional_build_runtime_config_requires_non_blank_tokens() {
    let cli = parse(&["--slack-app-token", "  ", "--slack-bot-token", "xoxb-1"]);
    let error = build_runtime_config(&cli, UserDirectory::default()).expect_err("missing token");
    assert_eq!(error.to_string(), "--slack-app-token is required");
}

#[test]
fn functional_build_runtime_config_maps_flags_into_settings() {
    let cli = with_tokens(&[
        "--report-layout",
        "delimited",
        "--stress-template-grid-id",
        "42",
        "--settlement-approver-links",
        "false",
        "--reconnect-delay-ms",
        "250",
    ]);
    let users = UserDirectory::from_entries([("U020LSUKYJF", "Albi Mema")]);
    let config = build_runtime_config(&cli, users).expect("config");

    assert_eq!(config.app_token, "xapp-1");
    assert_eq!(config.stress.layout.name, "delimited");
    assert_eq!(config.stress.template_grid_id, Some(42));
    assert_eq!(config.reconnect_delay.as_millis(), 250);
    assert!(!config.settlement.approver_links);
    assert_eq!(config.settlement.criteria.field_title, "Custodian");
    assert_eq!(config.settlement.criteria.field_value, "rht");
    assert!(config.settlement.users.contains("U020LSUKYJF"));
    assert_eq!(
        config.commands.stress_test_two_days,
        "/update_stress_test_data_2_days"
    );
}
