//! Token normalization into spreadsheet cell values.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Scale applied to every numeric report token; the report prints figures in millions.
pub const MILLIONS_SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
/// A normalized report token ready to be written into one cell.
pub enum CellValue {
    Numeric(f64),
    Text(String),
}

fn numeric_token_regex() -> &'static Regex {
    static NUMERIC_TOKEN: OnceLock<Regex> = OnceLock::new();
    NUMERIC_TOKEN.get_or_init(|| {
        Regex::new(r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+))([mM])?$").expect("numeric token regex")
    })
}

impl CellValue {
    /// Parses one report token.
    ///
    /// A decimal number with an optional `M`/`m` magnitude suffix becomes
    /// [`CellValue::Numeric`] scaled by [`MILLIONS_SCALE`]; anything else is
    /// kept verbatim as [`CellValue::Text`].
    pub fn parse(token: &str) -> Self {
        let trimmed = token.trim();
        let parsed = numeric_token_regex()
            .captures(trimmed)
            .and_then(|captures| captures.get(1))
            .and_then(|number| number.as_str().parse::<f64>().ok())
            .filter(|number| number.is_finite());
        match parsed {
            Some(number) => Self::Numeric(number * MILLIONS_SCALE),
            None => Self::Text(token.to_string()),
        }
    }
}
