//! Typed `spreadsheets.batchUpdate` request bodies.

use serde::Serialize;
use sift_report::{CellTarget, CellValue};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchRequest {
    InsertDimension(InsertDimensionRequest),
    UpdateCells(UpdateCellsRequest),
    CopyPaste(CopyPasteRequest),
    UpdateSheetProperties(UpdateSheetPropertiesRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Rows,
    Columns,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: Dimension,
    pub start_index: u32,
    pub end_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertDimensionRequest {
    pub range: DimensionRange,
    pub inherit_from_before: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCoordinate {
    pub sheet_id: i64,
    pub row_index: u32,
    pub column_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Half-open range; absent bounds are unbounded.
pub struct GridRange {
    pub sheet_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_row_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_row_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column_index: Option<u32>,
}

impl GridRange {
    /// Whole column `column` of `sheet_id`.
    pub fn column(sheet_id: i64, column: u32) -> Self {
        Self {
            sheet_id,
            start_row_index: None,
            end_row_index: None,
            start_column_index: Some(column),
            end_column_index: Some(column + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtendedValue {
    NumberValue(f64),
    StringValue(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Formatting applied from `start_index` (UTF-16 units) up to the next run.
pub struct TextFormatRun {
    pub start_index: u32,
    pub format: TextFormat,
}

impl TextFormatRun {
    pub fn link(start_index: u32, uri: impl Into<String>) -> Self {
        Self {
            start_index,
            format: TextFormat {
                link: Some(Link { uri: uri.into() }),
            },
        }
    }

    pub fn plain(start_index: u32) -> Self {
        Self {
            start_index,
            format: TextFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_value: ExtendedValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text_format_runs: Vec<TextFormatRun>,
}

impl CellData {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            user_entered_value: ExtendedValue::StringValue(value.into()),
            text_format_runs: Vec::new(),
        }
    }

    pub fn with_runs(mut self, runs: Vec<TextFormatRun>) -> Self {
        self.text_format_runs = runs;
        self
    }
}

impl From<&CellValue> for CellData {
    fn from(value: &CellValue) -> Self {
        let user_entered_value = match value {
            CellValue::Numeric(number) => ExtendedValue::NumberValue(*number),
            CellValue::Text(text) => ExtendedValue::StringValue(text.clone()),
        };
        Self {
            user_entered_value,
            text_format_runs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowData {
    pub values: Vec<CellData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCellsRequest {
    pub rows: Vec<RowData>,
    pub fields: String,
    pub start: GridCoordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PasteType {
    PasteNormal,
    PasteFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPasteRequest {
    pub source: GridRange,
    pub destination: GridRange,
    pub paste_type: PasteType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPropertiesUpdate {
    pub sheet_id: i64,
    pub title: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateSheetPropertiesRequest {
    pub properties: SheetPropertiesUpdate,
    pub fields: String,
}

impl BatchRequest {
    /// Writes one cell at `target` of `sheet_id`, replacing only `fields`.
    pub fn update_cell(sheet_id: i64, target: CellTarget, cell: CellData, fields: &str) -> Self {
        Self::UpdateCells(UpdateCellsRequest {
            rows: vec![RowData { values: vec![cell] }],
            fields: fields.to_string(),
            start: GridCoordinate {
                sheet_id,
                row_index: target.row,
                column_index: target.column,
            },
        })
    }

    pub fn insert_leading_column(sheet_id: i64) -> Self {
        Self::InsertDimension(InsertDimensionRequest {
            range: DimensionRange {
                sheet_id,
                dimension: Dimension::Columns,
                start_index: 0,
                end_index: 1,
            },
            inherit_from_before: false,
        })
    }

    pub fn copy_column_format(sheet_id: i64, from_column: u32, to_column: u32) -> Self {
        Self::CopyPaste(CopyPasteRequest {
            source: GridRange::column(sheet_id, from_column),
            destination: GridRange::column(sheet_id, to_column),
            paste_type: PasteType::PasteFormat,
        })
    }

    pub fn rename_and_move(sheet_id: i64, title: &str, index: u32) -> Self {
        Self::UpdateSheetProperties(UpdateSheetPropertiesRequest {
            properties: SheetPropertiesUpdate {
                sheet_id,
                title: title.to_string(),
                index,
            },
            fields: "title,index".to_string(),
        })
    }
}
