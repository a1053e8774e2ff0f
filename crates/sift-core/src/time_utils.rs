use chrono::{Datelike, Local, NaiveDate};

/// Returns the current Unix timestamp in milliseconds.
pub fn current_unix_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Returns today's date in the host's local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Formats `date` as `M.D.YYYY` without zero padding (`3.7.2024`).
pub fn dotted_date_label(date: NaiveDate) -> String {
    format!("{}.{}.{}", date.month(), date.day(), date.year())
}

/// Formats `date` as `MM/DD/YYYY` (`03/07/2024`).
pub fn slash_date_label(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}
