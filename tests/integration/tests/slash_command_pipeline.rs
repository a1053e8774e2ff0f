use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use httpmock::prelude::*;
use serde_json::json;
use sift_report::{PdfTextSource, ReportError, STRESS_TEST_ANCHOR, STRESS_TEST_WHITESPACE};
use sift_settlement::UserDirectory;
use sift_sheets::SheetsApiClient;
use sift_slack_runtime::{
    handle_slash_command, CommandContext, CommandNames, CommandResponder, SettlementMessageCriteria,
    SettlementSettings, SlackApiClient, SlashCommandPayload, StressTestSettings,
};

const REPORT_SPREADSHEET: &str = "report-book";
const SETTLEMENT_SPREADSHEET: &str = "settlement-book";

/// Text as a PDF library would hand it back: header noise, the anchor, a
/// column header, then the three figure rows with a stray blank line.
const EXTRACTED_REPORT: &str = "Treasury Daily\r\n\
Stress Testing Crypto Net Buy\r\n\
Bucket Desk Book Region Spot Perp Options Total Net\r\n\
BTC Net Buy Total 12.3M 45.6M 7.8M 9.1M 2.2M\r\n\
   \r\n\
ETH Net Buy Total 1.5M 2.5M 3.5M 4.5M 5.5M\r\n\
SOL Net Buy Total 0.1M 0.2M 0.3M 0.4M 0.5M\r\n\
Footnotes follow\r\n";

struct ExtractedTextSource;

impl PdfTextSource for ExtractedTextSource {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ReportError> {
        assert!(bytes.starts_with(b"%PDF-"));
        Ok(EXTRACTED_REPORT.to_string())
    }
}

/// Delivers replies to the command's `response_url` and remembers them.
struct PostingResponder {
    client: SlackApiClient,
    response_url: String,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl CommandResponder for PostingResponder {
    async fn respond(&self, text: &str) -> anyhow::Result<()> {
        self.client
            .post_command_response(&self.response_url, text, true)
            .await?;
        self.sent.lock().expect("sent lock").push(text.to_string());
        Ok(())
    }
}

fn build_context(base_url: &str) -> CommandContext {
    let slack = SlackApiClient::new(
        base_url.to_string(),
        "xapp-int".to_string(),
        "xoxb-int".to_string(),
        5_000,
    )
    .expect("slack client");
    let sheets =
        SheetsApiClient::new(base_url.to_string(), "ya29.int".to_string(), 5_000).expect("sheets");
    CommandContext::new(
        slack,
        sheets,
        Arc::new(ExtractedTextSource),
        StressTestSettings {
            channel_id: "C03B8CE5XK6".to_string(),
            page_size: 100,
            spreadsheet_id: REPORT_SPREADSHEET.to_string(),
            template_grid_id: Some(5),
            layout: &STRESS_TEST_WHITESPACE,
            anchor: STRESS_TEST_ANCHOR.to_string(),
        },
        SettlementSettings {
            channel_id: "C92T0N3DM".to_string(),
            page_size: 500,
            spreadsheet_id: SETTLEMENT_SPREADSHEET.to_string(),
            grid_id: 110_575_976,
            criteria: SettlementMessageCriteria {
                bot_id: "B02CV4E2Z9Q".to_string(),
                author_name: "Settlement Status".to_string(),
                field_title: "Custodian".to_string(),
                field_value: "rht".to_string(),
            },
            users: Arc::new(UserDirectory::from_entries([
                ("U020LSUKYJF", "Albi Mema"),
                ("U011SEVFY05", "Tanner Freeman"),
            ])),
            approver_links: true,
        },
    )
}

fn responder(server: &MockServer) -> PostingResponder {
    PostingResponder {
        client: SlackApiClient::new(
            server.base_url(),
            "xapp-int".to_string(),
            "xoxb-int".to_string(),
            5_000,
        )
        .expect("slack client"),
        response_url: server.url("/response/abc"),
        sent: Mutex::new(Vec::new()),
    }
}

fn payload(server: &MockServer, command: &str, user_id: &str) -> SlashCommandPayload {
    SlashCommandPayload {
        command: command.to_string(),
        user_id: user_id.to_string(),
        channel_id: "C-trigger".to_string(),
        response_url: server.url("/response/abc"),
        text: String::new(),
    }
}

fn numeric_cell(row: u32, column: u32, value: &str) -> String {
    format!(
        "{{\"userEnteredValue\":{{\"numberValue\":{value}}}}}]}}],\"fields\":\"userEnteredValue\",\"start\":{{\"sheetId\":314,\"rowIndex\":{row},\"columnIndex\":{column}}}"
    )
}

#[tokio::test]
async fn integration_stress_test_command_writes_report_block_and_replies() {
    let server = MockServer::start();
    let history = server.mock(|when, then| {
        when.method(GET)
            .path("/conversations.history")
            .query_param("channel", "C03B8CE5XK6")
            .header("authorization", "Bearer xoxb-int");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [
                {"ts": "3", "text": "good morning"},
                {"ts": "2", "files": [{
                    "id": "F-report",
                    "name": "Treasury Daily.pdf",
                    "mimetype": "application/pdf",
                    "url_private": server.url("/files/F-report")
                }]}
            ],
            "has_more": false
        }));
    });
    let download = server.mock(|when, then| {
        when.method(GET)
            .path("/files/F-report")
            .header("authorization", "Bearer xoxb-int");
        then.status(200).body("%PDF-1.6\n%binary report body");
    });
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/spreadsheets/{REPORT_SPREADSHEET}"));
        then.status(200).json_body(json!({
            "sheets": [
                {"properties": {"sheetId": 9, "title": "3.6.2024 - 1 day", "index": 0}},
                {"properties": {"sheetId": 5, "title": "Template", "index": 1}}
            ]
        }));
    });
    let copy = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/spreadsheets/{REPORT_SPREADSHEET}/sheets/5:copyTo"));
        then.status(200)
            .json_body(json!({"sheetId": 314, "title": "Copy of Template", "index": 2}));
    });
    let rename = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/spreadsheets/{REPORT_SPREADSHEET}:batchUpdate"))
            .body_includes("updateSheetProperties");
        then.status(200).json_body(json!({"replies": [{}]}));
    });
    let cells = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/spreadsheets/{REPORT_SPREADSHEET}:batchUpdate"))
            .body_includes("updateCells")
            .body_includes(numeric_cell(3, 13, "12300000.0"))
            .body_includes(numeric_cell(4, 14, "2500000.0"))
            .body_includes(numeric_cell(5, 15, "300000.0"))
            // fourth and fifth figures land swapped
            .body_includes(numeric_cell(3, 16, "2200000.0"))
            .body_includes(numeric_cell(3, 17, "9100000.0"));
        then.status(200).json_body(json!({"replies": []}));
    });
    let reply = server.mock(|when, then| {
        when.method(POST)
            .path("/response/abc")
            .body_includes("\"response_type\":\"ephemeral\"")
            .body_includes("Stress test data has been updated in the Google Sheet.")
            .body_includes("Created \\\"3.7.2024 - 1 day\\\" (15 cells).");
        then.status(200).body("ok");
    });

    let ctx = build_context(&server.base_url());
    let responder = responder(&server);
    let today = NaiveDate::from_ymd_opt(2024, 3, 7).expect("date");
    handle_slash_command(
        &ctx,
        &CommandNames::default(),
        &payload(&server, "/update_stress_test_data", "U-anyone"),
        today,
        &responder,
    )
    .await
    .expect("command handled");

    assert_eq!(history.calls(), 1);
    assert_eq!(download.calls(), 1);
    assert_eq!(copy.calls(), 1);
    assert_eq!(rename.calls(), 1);
    assert_eq!(cells.calls(), 1);
    assert_eq!(reply.calls(), 1);
}

#[tokio::test]
async fn integration_eod_settlement_command_appends_column_for_listed_user() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/conversations.history")
            .query_param("channel", "C92T0N3DM")
            .query_param("limit", "500");
        then.status(200).json_body(json!({
            "ok": true,
            "messages": [{
                "ts": "7",
                "bot_profile": {"id": "B02CV4E2Z9Q"},
                "attachments": [{
                    "author_name": "Settlement Status",
                    "fields": [
                        {"title": "ETH Deposit (1,250.5)", "value": "<https://etherscan.test/tx/a|blockchain_observed>"},
                        {"title": "ETH Deposit (1,250.5)", "value": "<https://etherscan.test/tx/b|blockchain_confirmed>"},
                        {"title": "USDC Withdrawal", "value": "pending"},
                        {"title": "Custodian", "value": "rht"},
                        {"title": "Approvers", "value": "<@U020LSUKYJF>, <@U999UNKNOWN>"}
                    ]
                }]
            }],
            "has_more": false
        }));
    });
    let batch = server.mock(|when, then| {
        when.method(POST)
            .path(format!("/spreadsheets/{SETTLEMENT_SPREADSHEET}:batchUpdate"))
            .body_includes("insertDimension")
            .body_includes("\"11/04/2024\"")
            .body_includes("@Albi Mema, <@U999UNKNOWN>")
            .body_includes("blockchain_observed, blockchain_confirmed")
            .body_includes("CHECK SLACK CHANNEL")
            .body_includes("copyPaste");
        then.status(200).json_body(json!({"replies": []}));
    });
    let replies = server.mock(|when, then| {
        when.method(POST).path("/response/abc");
        then.status(200).body("ok");
    });

    let ctx = build_context(&server.base_url());
    let responder = responder(&server);
    let today = NaiveDate::from_ymd_opt(2024, 11, 4).expect("date");
    handle_slash_command(
        &ctx,
        &CommandNames::default(),
        &payload(&server, "/update_eod_settlements", "U011SEVFY05"),
        today,
        &responder,
    )
    .await
    .expect("command handled");

    assert_eq!(batch.calls(), 1);
    assert_eq!(replies.calls(), 2);
    assert_eq!(
        *responder.sent.lock().expect("sent lock"),
        vec![
            "Found EOD message.".to_string(),
            "Google Sheet has been updated with the EOD data.".to_string()
        ]
    );
}
