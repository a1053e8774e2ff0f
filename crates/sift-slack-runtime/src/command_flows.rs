//! Stress-test import and EOD settlement flows behind the slash commands.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sift_core::{dotted_date_label, slash_date_label};
use sift_report::{
    extract_report_lines, map_fields, PdfTextSource, ReportError, ReportLayout,
};
use sift_settlement::{SettlementAggregator, UserDirectory};
use sift_sheets::{
    AppendedColumn, CreatedGrid, SettlementColumnOptions, SheetWriter, SheetsApiClient,
    SheetsError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::channel_scanner::{ChannelScanner, ScanError, SettlementMessageCriteria};
use crate::slack_api_client::SlackApiClient;

pub const PERMISSION_DENIED_REPLY: &str = "You do not have permission to use this command.";
const NO_REPORT_REPLY: &str = "No PDF report found in the channel.";
const NO_SETTLEMENT_REPLY: &str = "No EOD message found.";
const SETTLEMENT_FOUND_REPLY: &str = "Found EOD message.";
const SETTLEMENT_UPDATED_REPLY: &str = "Google Sheet has been updated with the EOD data.";

#[derive(Debug, Error)]
/// Failures that abort a command flow and are reported back verbatim.
pub enum CommandError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Sheets(#[from] SheetsError),
    #[error("report extraction task failed: {0}")]
    Task(String),
}

#[async_trait]
/// Delivers intermediate and final reply text to whoever triggered a command.
pub trait CommandResponder: Send + Sync {
    async fn respond(&self, text: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
pub struct StressTestSettings {
    pub channel_id: String,
    pub page_size: u32,
    pub spreadsheet_id: String,
    /// Grid copied for each new dated grid; the first tab when unset.
    pub template_grid_id: Option<i64>,
    pub layout: &'static ReportLayout,
    pub anchor: String,
}

#[derive(Debug, Clone)]
pub struct SettlementSettings {
    pub channel_id: String,
    pub page_size: u32,
    pub spreadsheet_id: String,
    pub grid_id: i64,
    pub criteria: SettlementMessageCriteria,
    /// Both the approver-name table and the list of users allowed to run the command.
    pub users: Arc<UserDirectory>,
    pub approver_links: bool,
}

#[derive(Clone)]
/// Everything a command invocation reads through. Shared read-only across tasks.
pub struct CommandContext {
    slack: SlackApiClient,
    scanner: ChannelScanner,
    pdf_source: Arc<dyn PdfTextSource>,
    stress_writer: SheetWriter,
    settlement_writer: SheetWriter,
    aggregator: SettlementAggregator,
    stress: StressTestSettings,
    settlement: SettlementSettings,
}

impl CommandContext {
    pub fn new(
        slack: SlackApiClient,
        sheets: SheetsApiClient,
        pdf_source: Arc<dyn PdfTextSource>,
        stress: StressTestSettings,
        settlement: SettlementSettings,
    ) -> Self {
        Self {
            scanner: ChannelScanner::new(slack.clone()),
            stress_writer: SheetWriter::new(sheets.clone(), stress.spreadsheet_id.clone()),
            settlement_writer: SheetWriter::new(sheets, settlement.spreadsheet_id.clone()),
            aggregator: SettlementAggregator::new(Arc::clone(&settlement.users)),
            slack,
            pdf_source,
            stress,
            settlement,
        }
    }

    pub fn slack_client(&self) -> &SlackApiClient {
        &self.slack
    }
}

/// `M.D.YYYY - N day`, without zero padding.
pub fn dated_grid_name(date: NaiveDate, day: u32) -> String {
    format!("{} - {day} day", dotted_date_label(date))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridOutcome {
    Created(CreatedGrid),
    AlreadyExists { name: String },
}

impl GridOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StressTestOutcome {
    NoReport,
    AnchorMissing {
        anchor: String,
    },
    Completed {
        file_name: String,
        grids: Vec<GridOutcome>,
        gaps: usize,
    },
}

impl StressTestOutcome {
    pub fn render_reply(&self) -> String {
        match self {
            Self::NoReport => NO_REPORT_REPLY.to_string(),
            Self::AnchorMissing { anchor } => format!("{anchor} section not found in the PDF."),
            Self::Completed { grids, gaps, .. } => {
                let created = grids.iter().filter(|grid| grid.is_created()).count();
                let mut lines = vec![match created {
                    0 => "Stress test sheets are already up to date.".to_string(),
                    1 => "Stress test data has been updated in the Google Sheet.".to_string(),
                    2 => "Stress test data has been updated in two Google Sheets.".to_string(),
                    count => format!("Stress test data has been updated in {count} Google Sheets."),
                }];
                for grid in grids {
                    match grid {
                        GridOutcome::Created(created) => lines.push(format!(
                            "Created \"{}\" ({} cells).",
                            created.title, created.cells_written
                        )),
                        GridOutcome::AlreadyExists { name } => lines.push(
                            SheetsError::GridAlreadyExists { name: name.clone() }.to_string(),
                        ),
                    }
                }
                if *gaps > 0 {
                    lines.push(format!(
                        "{gaps} report field(s) were missing from the PDF and left blank."
                    ));
                }
                lines.join("\n")
            }
        }
    }
}

/// Imports the newest stress-test PDF into one dated grid per entry of `day_spans`.
///
/// Every grid is populated from the same extracted report. A grid whose name
/// already exists is reported and skipped; any other failure aborts the flow.
pub async fn run_stress_test_update(
    ctx: &CommandContext,
    day_spans: &[u32],
    today: NaiveDate,
) -> Result<StressTestOutcome, CommandError> {
    let settings = &ctx.stress;
    let Some(file) = ctx
        .scanner
        .find_first_pdf(&settings.channel_id, settings.page_size, None)
        .await?
    else {
        return Ok(StressTestOutcome::NoReport);
    };
    let bytes = ctx.scanner.download_file(&file).await?;
    info!(
        file = file.display_name(),
        bytes = bytes.len(),
        "downloaded stress test report"
    );

    let source = Arc::clone(&ctx.pdf_source);
    let anchor = settings.anchor.clone();
    let extracted = tokio::task::spawn_blocking(move || {
        extract_report_lines(&bytes, source.as_ref(), &anchor)
    })
    .await
    .map_err(|error| CommandError::Task(error.to_string()))?;
    let lines = match extracted {
        Ok(lines) => lines,
        Err(ReportError::AnchorNotFound { anchor }) => {
            warn!(file = file.display_name(), anchor, "report anchor not found");
            return Ok(StressTestOutcome::AnchorMissing { anchor });
        }
        Err(error) => return Err(error.into()),
    };

    let mapping = map_fields(&lines, settings.layout);
    debug!(
        layout = settings.layout.name,
        cells = mapping.cells.len(),
        gaps = mapping.gaps.len(),
        "mapped report fields"
    );

    let mut grids = Vec::with_capacity(day_spans.len());
    for &day in day_spans {
        let name = dated_grid_name(today, day);
        match ctx
            .stress_writer
            .create_and_populate(settings.template_grid_id, &name, &mapping.cells)
            .await
        {
            Ok(created) => grids.push(GridOutcome::Created(created)),
            Err(error) if error.is_already_done() => {
                grids.push(GridOutcome::AlreadyExists { name });
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(StressTestOutcome::Completed {
        file_name: file.display_name().to_string(),
        grids,
        gaps: mapping.gaps.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    Unauthorized,
    NotFound,
    Updated(AppendedColumn),
}

impl SettlementOutcome {
    pub fn render_reply(&self) -> &'static str {
        match self {
            Self::Unauthorized => PERMISSION_DENIED_REPLY,
            Self::NotFound => NO_SETTLEMENT_REPLY,
            Self::Updated(_) => SETTLEMENT_UPDATED_REPLY,
        }
    }
}

/// Appends the newest EOD settlement notice as a new first column of the settlement grid.
///
/// `user_id` must be listed in the settlement user directory; otherwise the
/// flow returns [`SettlementOutcome::Unauthorized`] without calling Slack or
/// Sheets. A progress reply is sent through `responder` once the notice is found.
pub async fn run_settlement_update(
    ctx: &CommandContext,
    user_id: &str,
    today: NaiveDate,
    responder: &dyn CommandResponder,
) -> Result<SettlementOutcome, CommandError> {
    let settings = &ctx.settlement;
    if !settings.users.contains(user_id) {
        warn!(user_id, "settlement command refused for unlisted user");
        return Ok(SettlementOutcome::Unauthorized);
    }

    let Some(message) = ctx
        .scanner
        .find_settlement_message(
            &settings.channel_id,
            settings.page_size,
            None,
            &settings.criteria,
        )
        .await?
    else {
        return Ok(SettlementOutcome::NotFound);
    };
    if let Err(error) = responder.respond(SETTLEMENT_FOUND_REPLY).await {
        warn!(error = %format!("{error:#}"), "failed to send settlement progress reply");
    }

    let fields = message
        .attachments
        .first()
        .map(|attachment| attachment.fields.as_slice())
        .unwrap_or_default();
    let summary = ctx.aggregator.aggregate(fields);
    info!(
        ts = message.ts.as_deref().unwrap_or_default(),
        records = summary.records.len(),
        "aggregated settlement message"
    );

    let options = SettlementColumnOptions {
        approver_links: settings.approver_links,
        ..SettlementColumnOptions::default()
    };
    let appended = ctx
        .settlement_writer
        .append_settlement_column(settings.grid_id, &slash_date_label(today), &summary, &options)
        .await?;
    Ok(SettlementOutcome::Updated(appended))
}
