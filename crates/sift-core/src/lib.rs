//! Foundational low-level utilities shared across Sift crates.
//!
//! Provides the calendar-date labels used for grid names and report rows, and
//! the bounded-length text helpers used when surfacing remote errors.

pub mod text_utils;
pub mod time_utils;

pub use text_utils::{truncate_for_error, truncate_for_slack};
pub use time_utils::{current_unix_timestamp_ms, dotted_date_label, local_today, slash_date_label};
