//! PDF signature validation, text extraction, and anchor slicing.

use tracing::debug;

use crate::ReportError;

/// Leading bytes every PDF file starts with.
pub const PDF_SIGNATURE: &[u8; 5] = b"%PDF-";

/// Marker that opens the stress-test table inside the liquidity report.
pub const STRESS_TEST_ANCHOR: &str = "Stress Testing Crypto Net Buy";

/// Black-box text extraction over raw PDF bytes.
pub trait PdfTextSource: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ReportError>;
}

#[derive(Debug, Default, Clone, Copy)]
/// [`PdfTextSource`] backed by the `pdf-extract` crate.
pub struct PdfExtractTextSource;

impl PdfTextSource for PdfExtractTextSource {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ReportError> {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|error| ReportError::TextExtraction(error.to_string()))
    }
}

pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

/// Returns the trimmed, non-blank lines from the first occurrence of `anchor`
/// to the end of `text`, or `None` when the anchor is absent.
pub fn lines_after_anchor(text: &str, anchor: &str) -> Option<Vec<String>> {
    let start = text.find(anchor)?;
    Some(
        text[start..]
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
    )
}

/// Validates `bytes` as a PDF, extracts its text through `source`, and returns
/// the lines following `anchor`.
///
/// The signature check runs before `source` is consulted, so non-PDF payloads
/// never reach the extraction library.
pub fn extract_report_lines(
    bytes: &[u8],
    source: &dyn PdfTextSource,
    anchor: &str,
) -> Result<Vec<String>, ReportError> {
    if !has_pdf_signature(bytes) {
        return Err(ReportError::InvalidFormat);
    }
    let text = source.extract_text(bytes)?;
    let lines = lines_after_anchor(&text, anchor).ok_or_else(|| ReportError::AnchorNotFound {
        anchor: anchor.to_string(),
    })?;
    debug!(
        anchor,
        line_count = lines.len(),
        "extracted report lines after anchor"
    );
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{
        extract_report_lines, has_pdf_signature, lines_after_anchor, PdfTextSource,
        STRESS_TEST_ANCHOR,
    };
    use crate::ReportError;

    struct CountingSource {
        text: String,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PdfTextSource for CountingSource {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String, ReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    struct FailingSource;

    impl PdfTextSource for FailingSource {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String, ReportError> {
            Err(ReportError::TextExtraction("broken xref table".to_string()))
        }
    }

    #[test]
    fn unit_has_pdf_signature_requires_exact_prefix() {
        assert!(has_pdf_signature(b"%PDF-1.7\n"));
        assert!(!has_pdf_signature(b"%PDF"));
        assert!(!has_pdf_signature(b"<html>%PDF-"));
        assert!(!has_pdf_signature(b""));
    }

    #[test]
    fn functional_extract_report_lines_rejects_non_pdf_before_extraction() {
        let source = CountingSource::new(STRESS_TEST_ANCHOR);
        for payload in [&b"GIF89a"[..], b"", b"%PDX-1.4", b"pdf-1.4"] {
            let error = extract_report_lines(payload, &source, STRESS_TEST_ANCHOR)
                .expect_err("non pdf must fail");
            assert_eq!(error, ReportError::InvalidFormat);
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn functional_extract_report_lines_slices_from_anchor_and_drops_blank_lines() {
        let text = "Cover page\nSummary 1.0M\n\nStress Testing Crypto Net Buy (USD)\n  \nHeader row\n\n  Scenario A 1.0M  \n";
        let source = CountingSource::new(text);
        let lines = extract_report_lines(b"%PDF-1.4 body", &source, STRESS_TEST_ANCHOR)
            .expect("lines");
        assert_eq!(
            lines,
            vec![
                "Stress Testing Crypto Net Buy (USD)".to_string(),
                "Header row".to_string(),
                "Scenario A 1.0M".to_string(),
            ]
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unit_lines_after_anchor_starts_mid_line_at_anchor_offset() {
        let text = "prefix Stress Testing Crypto Net Buy tail\r\nnext\r\n";
        let lines = lines_after_anchor(text, STRESS_TEST_ANCHOR).expect("anchor");
        assert_eq!(
            lines,
            vec![
                "Stress Testing Crypto Net Buy tail".to_string(),
                "next".to_string()
            ]
        );
    }

    #[test]
    fn regression_extract_report_lines_reports_missing_anchor() {
        let source = CountingSource::new("Liquidity overview\nno table here\n");
        let error = extract_report_lines(b"%PDF-1.7", &source, STRESS_TEST_ANCHOR)
            .expect_err("missing anchor");
        assert_eq!(
            error,
            ReportError::AnchorNotFound {
                anchor: STRESS_TEST_ANCHOR.to_string()
            }
        );
        assert_eq!(
            error.to_string(),
            "Stress Testing Crypto Net Buy section not found in the PDF"
        );
    }

    #[test]
    fn regression_extract_report_lines_propagates_extraction_failure() {
        let error = extract_report_lines(b"%PDF-1.7", &FailingSource, STRESS_TEST_ANCHOR)
            .expect_err("extraction failure");
        assert!(matches!(error, ReportError::TextExtraction(message) if message.contains("xref")));
    }
}
