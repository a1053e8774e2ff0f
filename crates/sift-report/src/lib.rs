//! Report text extraction and cell mapping for Sift.
//!
//! Turns the raw bytes of a stress-test PDF into the ordered lines that follow
//! the report anchor, then maps fixed token positions of those lines onto
//! fixed spreadsheet cells through a named [`ReportLayout`].

pub mod cell_value;
pub mod field_mapper;
pub mod layouts;
pub mod text_extractor;

use thiserror::Error;

pub use cell_value::{CellValue, MILLIONS_SCALE};
pub use field_mapper::{
    map_fields, CellMapping, CellTarget, FieldSource, GapReason, MappedCell, MappingGap,
    MappingOutcome, ReportLayout, TokenScheme,
};
pub use layouts::{STRESS_TEST_DELIMITED, STRESS_TEST_WHITESPACE};
pub use text_extractor::{
    extract_report_lines, has_pdf_signature, lines_after_anchor, PdfExtractTextSource,
    PdfTextSource, PDF_SIGNATURE, STRESS_TEST_ANCHOR,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Enumerates failures raised while turning a PDF into report lines.
pub enum ReportError {
    #[error("the file does not appear to be a valid PDF")]
    InvalidFormat,
    #[error("{anchor} section not found in the PDF")]
    AnchorNotFound { anchor: String },
    #[error("pdf text extraction failed: {0}")]
    TextExtraction(String),
}
