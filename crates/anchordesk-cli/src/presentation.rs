//! Table formatting for terminal output.

/// Shorten `s` to at most `max_chars` characters, ending in "..." when cut.
///
/// # Examples
///
/// ```rust
/// use anchordesk_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Tides", 10), "Tides");
/// assert_eq!(truncate_string("Harbor strike enters day two", 12), "Harbor st...");
/// ```
pub fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_string("Zürich früh", 11), "Zürich früh");
        assert_eq!(truncate_string("Zürich früh", 8), "Züric...");
    }
}
