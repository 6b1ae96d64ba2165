//! String formatting utilities for UI rendering.

use chrono::{DateTime, Utc};

/// Truncate a string to max length, adding ellipsis if needed.
pub fn truncate(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let truncated: String = s.chars().take(max_len - 3).collect();
    format!("{}...", truncated)
}

/// Format a lock time for display; entries without one show a dash.
pub fn format_locked_at(dt: Option<&DateTime<Utc>>, pretty: bool) -> String {
    match dt {
        Some(dt) if pretty => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        Some(dt) => dt.to_rfc3339(),
        None => "-".to_string(),
    }
}
