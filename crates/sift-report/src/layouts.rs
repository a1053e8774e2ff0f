//! Hard-coded report layouts.
//!
//! Both variants fill the same 3x5 block (`N4:R6`) from rows two to four of
//! the anchored table. They differ in how lines are tokenized and therefore in
//! which token positions feed each column; the fourth and fifth figures land
//! swapped in columns Q and R in both.

use crate::{CellMapping, ReportLayout, TokenScheme};

/// Whitespace-tokenized report: a four-word row label precedes the figures.
pub const STRESS_TEST_WHITESPACE: ReportLayout = ReportLayout {
    name: "whitespace",
    scheme: TokenScheme::Whitespace,
    mappings: &[
        CellMapping::new(2, 4, 3, 13),
        CellMapping::new(3, 4, 4, 13),
        CellMapping::new(4, 4, 5, 13),
        CellMapping::new(2, 5, 3, 14),
        CellMapping::new(3, 5, 4, 14),
        CellMapping::new(4, 5, 5, 14),
        CellMapping::new(2, 6, 3, 15),
        CellMapping::new(3, 6, 4, 15),
        CellMapping::new(4, 6, 5, 15),
        CellMapping::new(2, 8, 3, 16),
        CellMapping::new(3, 8, 4, 16),
        CellMapping::new(4, 8, 5, 16),
        CellMapping::new(2, 7, 3, 17),
        CellMapping::new(3, 7, 4, 17),
        CellMapping::new(4, 7, 5, 17),
    ],
};

/// Pipe-delimited report: the row label is a single cell before the figures.
pub const STRESS_TEST_DELIMITED: ReportLayout = ReportLayout {
    name: "delimited",
    scheme: TokenScheme::Delimited('|'),
    mappings: &[
        CellMapping::new(2, 1, 3, 13),
        CellMapping::new(3, 1, 4, 13),
        CellMapping::new(4, 1, 5, 13),
        CellMapping::new(2, 2, 3, 14),
        CellMapping::new(3, 2, 4, 14),
        CellMapping::new(4, 2, 5, 14),
        CellMapping::new(2, 3, 3, 15),
        CellMapping::new(3, 3, 4, 15),
        CellMapping::new(4, 3, 5, 15),
        CellMapping::new(2, 5, 3, 16),
        CellMapping::new(3, 5, 4, 16),
        CellMapping::new(4, 5, 5, 16),
        CellMapping::new(2, 4, 3, 17),
        CellMapping::new(3, 4, 4, 17),
        CellMapping::new(4, 4, 5, 17),
    ],
};
