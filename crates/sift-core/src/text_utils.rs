/// Truncates remote error bodies before they are embedded in error messages.
pub fn truncate_for_error(value: &str, max_chars: usize) -> String {
    truncate_for_slack(value, max_chars)
}

/// Truncates `value` to `max_chars` characters, appending `...` when cut.
pub fn truncate_for_slack(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = String::new();
    for ch in value.chars().take(max_chars) {
        truncated.push(ch);
    }
    truncated.push_str("...");
    truncated
}
