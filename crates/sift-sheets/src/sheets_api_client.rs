//! Google Sheets v4 REST client used by the sheet writer.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sift_core::truncate_for_error;
use tracing::debug;

use crate::{BatchRequest, SheetsError};

pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

const GRID_LISTING_FIELDS: &str = "sheets.properties(sheetId,title,index)";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// Identity and position of one grid (tab) of a spreadsheet.
pub struct GridProperties {
    pub sheet_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetSheet {
    properties: GridProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetListing {
    #[serde(default)]
    sheets: Vec<SpreadsheetSheet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

#[derive(Clone)]
pub struct SheetsApiClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl SheetsApiClient {
    pub fn new(
        api_base: String,
        access_token: String,
        request_timeout_ms: u64,
    ) -> Result<Self, SheetsError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("sift-sheets-writer"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .map_err(SheetsError::Client)?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.trim().to_string(),
        })
    }

    /// Lists every grid of `spreadsheet_id`, ordered by tab index.
    pub async fn list_grids(&self, spreadsheet_id: &str) -> Result<Vec<GridProperties>, SheetsError> {
        let listing: SpreadsheetListing = self
            .request_json(
                "spreadsheets.get",
                self.http
                    .get(format!("{}/spreadsheets/{}", self.api_base, spreadsheet_id))
                    .query(&[("fields", GRID_LISTING_FIELDS)])
                    .bearer_auth(&self.access_token),
            )
            .await?;
        let mut grids = listing
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties)
            .collect::<Vec<_>>();
        grids.sort_by_key(|grid| grid.index);
        Ok(grids)
    }

    /// Copies grid `sheet_id` into `destination_spreadsheet_id`, returning the new grid.
    pub async fn copy_grid_to(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        destination_spreadsheet_id: &str,
    ) -> Result<GridProperties, SheetsError> {
        self.request_json(
            "sheets.copyTo",
            self.http
                .post(format!(
                    "{}/spreadsheets/{}/sheets/{}:copyTo",
                    self.api_base, spreadsheet_id, sheet_id
                ))
                .bearer_auth(&self.access_token)
                .json(&json!({ "destinationSpreadsheetId": destination_spreadsheet_id })),
        )
        .await
    }

    pub async fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: &[BatchRequest],
    ) -> Result<BatchUpdateResponse, SheetsError> {
        let response: BatchUpdateResponse = self
            .request_json(
                "spreadsheets.batchUpdate",
                self.http
                    .post(format!(
                        "{}/spreadsheets/{}:batchUpdate",
                        self.api_base, spreadsheet_id
                    ))
                    .bearer_auth(&self.access_token)
                    .json(&json!({ "requests": requests })),
            )
            .await?;
        debug!(
            spreadsheet_id,
            requests = requests.len(),
            replies = response.replies.len(),
            "sheets batch update applied"
        );
        Ok(response)
    }

    async fn request_json<T>(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SheetsError>
    where
        T: DeserializeOwned,
    {
        let response = request.send().await.map_err(|source| SheetsError::Http {
            operation: operation.to_string(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                body: truncate_for_error(&body, 800),
            });
        }
        response.json::<T>().await.map_err(|source| SheetsError::Decode {
            operation: operation.to_string(),
            source,
        })
    }
}
