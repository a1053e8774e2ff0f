//! The two spreadsheet write modes: template copy + populate, and in-place column append.

use sift_report::{CellTarget, MappedCell};
use sift_settlement::{ApproverLine, SettlementRecord, SettlementSummary};
use tracing::{info, warn};

use crate::{BatchRequest, CellData, SheetsApiClient, SheetsError, TextFormatRun};

/// Written where a settlement has no transfer links to show.
pub const CHECK_SLACK_PLACEHOLDER: &str = "CHECK SLACK CHANNEL";
pub const SLACK_PROFILE_REDIRECT_BASE: &str = "https://slack.com/app_redirect?channel=";

const REPORT_CELL_FIELDS: &str = "userEnteredValue";
const SETTLEMENT_CELL_FIELDS: &str = "*";
const FIRST_RECORD_ROW: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGrid {
    pub grid_id: i64,
    pub title: String,
    pub cells_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedColumn {
    pub grid_id: i64,
    pub rows_written: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementColumnOptions {
    /// Label written above the custodian value.
    pub custodian_label: String,
    /// Link each resolved approver name to the user's Slack profile.
    pub approver_links: bool,
}

impl Default for SettlementColumnOptions {
    fn default() -> Self {
        Self {
            custodian_label: "Custodian".to_string(),
            approver_links: true,
        }
    }
}

#[derive(Clone)]
/// Writes into one spreadsheet.
pub struct SheetWriter {
    client: SheetsApiClient,
    spreadsheet_id: String,
}

impl SheetWriter {
    pub fn new(client: SheetsApiClient, spreadsheet_id: impl Into<String>) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    /// Duplicates the template grid as `name` at tab index 0 and writes `cells` into it.
    ///
    /// Fails with [`SheetsError::GridAlreadyExists`] before any mutation when a
    /// grid titled `name` is already listed. The listing and the copy are not
    /// atomic: two concurrent calls for the same name can both create a grid.
    /// Without `template_grid_id` the first tab of the spreadsheet is the template.
    pub async fn create_and_populate(
        &self,
        template_grid_id: Option<i64>,
        name: &str,
        cells: &[MappedCell],
    ) -> Result<CreatedGrid, SheetsError> {
        let grids = self.client.list_grids(&self.spreadsheet_id).await?;
        if grids.iter().any(|grid| grid.title == name) {
            warn!(grid = name, "grid already exists; skipping creation");
            return Err(SheetsError::GridAlreadyExists {
                name: name.to_string(),
            });
        }

        let template_id = match template_grid_id {
            Some(grid_id) => grid_id,
            None => grids
                .first()
                .map(|grid| grid.sheet_id)
                .ok_or_else(|| SheetsError::TemplateMissing {
                    spreadsheet_id: self.spreadsheet_id.clone(),
                })?,
        };

        let copied = self
            .client
            .copy_grid_to(&self.spreadsheet_id, template_id, &self.spreadsheet_id)
            .await?;
        self.client
            .batch_update(
                &self.spreadsheet_id,
                &[BatchRequest::rename_and_move(copied.sheet_id, name, 0)],
            )
            .await?;
        info!(
            grid = name,
            grid_id = copied.sheet_id,
            template_id,
            "created grid from template"
        );

        if cells.is_empty() {
            warn!(grid = name, "no report cells to write into new grid");
            return Ok(CreatedGrid {
                grid_id: copied.sheet_id,
                title: name.to_string(),
                cells_written: 0,
            });
        }

        let requests = cells
            .iter()
            .map(|cell| {
                BatchRequest::update_cell(
                    copied.sheet_id,
                    cell.target,
                    CellData::from(&cell.value),
                    REPORT_CELL_FIELDS,
                )
            })
            .collect::<Vec<_>>();
        self.client
            .batch_update(&self.spreadsheet_id, &requests)
            .await?;
        info!(grid = name, cells = cells.len(), "report cells written");

        Ok(CreatedGrid {
            grid_id: copied.sheet_id,
            title: name.to_string(),
            cells_written: cells.len(),
        })
    }

    /// Inserts a new first column into `grid_id` and fills it with `summary` in one batch.
    pub async fn append_settlement_column(
        &self,
        grid_id: i64,
        date_label: &str,
        summary: &SettlementSummary,
        options: &SettlementColumnOptions,
    ) -> Result<AppendedColumn, SheetsError> {
        let requests = settlement_column_requests(grid_id, date_label, summary, options);
        // insert + copy-format bracket the cell writes
        let rows_written = requests.len().saturating_sub(2);
        self.client
            .batch_update(&self.spreadsheet_id, &requests)
            .await?;
        info!(
            grid_id,
            rows = rows_written,
            records = summary.records.len(),
            "settlement column appended"
        );
        Ok(AppendedColumn {
            grid_id,
            rows_written,
        })
    }
}

/// Builds the ordered batch for one settlement column.
///
/// Rows: date, approvers, custodian label, custodian value, then a title row
/// and a status row per record. The new column takes column B's formatting last.
pub fn settlement_column_requests(
    grid_id: i64,
    date_label: &str,
    summary: &SettlementSummary,
    options: &SettlementColumnOptions,
) -> Vec<BatchRequest> {
    let text_cell = |row: u32, cell: CellData| {
        BatchRequest::update_cell(grid_id, CellTarget::new(row, 0), cell, SETTLEMENT_CELL_FIELDS)
    };

    let approvers = summary.approvers.clone().unwrap_or_default();
    let mut requests = vec![
        BatchRequest::insert_leading_column(grid_id),
        text_cell(0, CellData::text(date_label)),
        text_cell(1, approver_cell(&approvers, options.approver_links)),
        text_cell(2, CellData::text(options.custodian_label.as_str())),
        text_cell(
            3,
            CellData::text(summary.custodian.clone().unwrap_or_default()),
        ),
    ];

    if summary.records.is_empty() {
        requests.push(text_cell(
            FIRST_RECORD_ROW,
            CellData::text(CHECK_SLACK_PLACEHOLDER),
        ));
    } else {
        for (index, record) in summary.records.iter().enumerate() {
            let title_row = FIRST_RECORD_ROW + 2 * index as u32;
            requests.push(text_cell(title_row, CellData::text(record.title.as_str())));
            requests.push(text_cell(title_row + 1, status_cell(record)));
        }
    }

    requests.push(BatchRequest::copy_column_format(grid_id, 1, 0));
    requests
}

fn approver_cell(approvers: &ApproverLine, with_links: bool) -> CellData {
    let cell = CellData::text(approvers.text.as_str());
    if !with_links || approvers.mentions.is_empty() {
        return cell;
    }
    let text_len = utf16_len(&approvers.text);
    let mut runs: Vec<TextFormatRun> = Vec::new();
    for (index, mention) in approvers.mentions.iter().enumerate() {
        runs.push(TextFormatRun::link(
            mention.start_utf16,
            format!("{SLACK_PROFILE_REDIRECT_BASE}{}", mention.user_id),
        ));
        let next_start = approvers
            .mentions
            .get(index + 1)
            .map(|next| next.start_utf16);
        if mention.end_utf16 < text_len && next_start != Some(mention.end_utf16) {
            runs.push(TextFormatRun::plain(mention.end_utf16));
        }
    }
    cell.with_runs(runs)
}

fn status_cell(record: &SettlementRecord) -> CellData {
    if !record.has_links() {
        return CellData::text(CHECK_SLACK_PLACEHOLDER);
    }
    let mut text = String::new();
    let mut runs = Vec::with_capacity(record.links.len());
    for (index, (link, status)) in record.links.iter().zip(&record.statuses).enumerate() {
        if index > 0 {
            text.push_str(", ");
        }
        runs.push(TextFormatRun::link(utf16_len(&text), link.as_str()));
        text.push_str(status.as_str());
    }
    CellData::text(text).with_runs(runs)
}

fn utf16_len(value: &str) -> u32 {
    u32::try_from(value.encode_utf16().count()).unwrap_or(u32::MAX)
}
