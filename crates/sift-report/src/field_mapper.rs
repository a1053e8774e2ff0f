//! Re-indexes report tokens into fixed destination cells.

use serde::Serialize;
use tracing::warn;

use crate::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// Zero-based destination cell within a grid.
pub struct CellTarget {
    pub row: u32,
    pub column: u32,
}

impl CellTarget {
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Renders the target in A1 notation (`row 3, column 13` is `N4`).
    pub fn a1_label(&self) -> String {
        let mut letters = Vec::new();
        let mut remaining = self.column + 1;
        while remaining > 0 {
            let offset = ((remaining - 1) % 26) as u8;
            letters.push(char::from(b'A' + offset));
            remaining = (remaining - 1) / 26;
        }
        letters.iter().rev().collect::<String>() + &(self.row + 1).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// How one report line is split into tokens.
pub enum TokenScheme {
    /// Split on runs of whitespace.
    Whitespace,
    /// Split on a delimiter character; tokens are trimmed and empty ones dropped.
    Delimited(char),
}

impl TokenScheme {
    pub fn tokenize<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match self {
            Self::Whitespace => line.split_whitespace().collect(),
            Self::Delimited(delimiter) => line
                .split(*delimiter)
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Zero-based (line, token) position in the extracted report lines.
pub struct FieldSource {
    pub line: usize,
    pub token: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellMapping {
    pub source: FieldSource,
    pub target: CellTarget,
}

impl CellMapping {
    pub const fn new(line: usize, token: usize, row: u32, column: u32) -> Self {
        Self {
            source: FieldSource { line, token },
            target: CellTarget::new(row, column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
/// Static description of one report variant.
pub struct ReportLayout {
    pub name: &'static str,
    pub scheme: TokenScheme,
    pub mappings: &'static [CellMapping],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedCell {
    pub target: CellTarget,
    pub value: CellValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    MissingLine,
    MissingToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// A mapping entry whose source token did not exist in the report.
pub struct MappingGap {
    pub source: FieldSource,
    pub target: CellTarget,
    pub reason: GapReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingOutcome {
    pub cells: Vec<MappedCell>,
    pub gaps: Vec<MappingGap>,
}

impl MappingOutcome {
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Maps `lines` onto `layout`'s fixed targets.
///
/// Entries whose source line or token is missing are skipped and reported as
/// [`MappingGap`]s; the remaining cells keep the layout's mapping order.
pub fn map_fields(lines: &[String], layout: &ReportLayout) -> MappingOutcome {
    let tokenized = lines
        .iter()
        .map(|line| layout.scheme.tokenize(line))
        .collect::<Vec<_>>();

    let mut outcome = MappingOutcome::default();
    for mapping in layout.mappings {
        let Some(tokens) = tokenized.get(mapping.source.line) else {
            outcome.gaps.push(record_gap(layout, mapping, GapReason::MissingLine));
            continue;
        };
        let Some(token) = tokens.get(mapping.source.token) else {
            outcome
                .gaps
                .push(record_gap(layout, mapping, GapReason::MissingToken));
            continue;
        };
        outcome.cells.push(MappedCell {
            target: mapping.target,
            value: CellValue::parse(token),
        });
    }
    outcome
}

fn record_gap(layout: &ReportLayout, mapping: &CellMapping, reason: GapReason) -> MappingGap {
    warn!(
        layout = layout.name,
        cell = %mapping.target.a1_label(),
        line = mapping.source.line,
        token = mapping.source.token,
        ?reason,
        "report value missing for cell"
    );
    MappingGap {
        source: mapping.source,
        target: mapping.target,
        reason,
    }
}
