//! Google Sheets writer for Sift.
//!
//! Wraps the Sheets v4 REST surface Sift needs (grid listing, `copyTo`, and
//! `batchUpdate`) and builds the two write modes on top of it: dated grids
//! created from a template, and settlement columns appended in place.

pub mod batch_requests;
pub mod sheet_writer;
pub mod sheets_api_client;

use thiserror::Error;

pub use batch_requests::{
    BatchRequest, CellData, Dimension, ExtendedValue, GridCoordinate, GridRange, PasteType,
    TextFormatRun,
};
pub use sheet_writer::{
    settlement_column_requests, AppendedColumn, CreatedGrid, SettlementColumnOptions, SheetWriter,
    CHECK_SLACK_PLACEHOLDER, SLACK_PROFILE_REDIRECT_BASE,
};
pub use sheets_api_client::{
    BatchUpdateResponse, GridProperties, SheetsApiClient, DEFAULT_SHEETS_API_BASE,
};

#[derive(Debug, Error)]
/// Enumerates failures raised by spreadsheet reads and writes.
pub enum SheetsError {
    #[error("The sheet \"{name}\" already exists.")]
    GridAlreadyExists { name: String },
    #[error("spreadsheet {spreadsheet_id} has no grid to use as a template")]
    TemplateMissing { spreadsheet_id: String },
    #[error("failed to create sheets api client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("sheets api {operation} request failed: {source}")]
    Http {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("sheets api {operation} failed with status {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("failed to decode sheets {operation} response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
}

impl SheetsError {
    /// True for the one condition callers treat as "already done" rather than a failure.
    pub fn is_already_done(&self) -> bool {
        matches!(self, Self::GridAlreadyExists { .. })
    }
}
