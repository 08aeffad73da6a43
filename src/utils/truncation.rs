const MAX_ERROR_LENGTH: usize = 2_000;

/// Keep at most `max` characters, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Bound captured stderr before it lands in an outcome or a log line.
pub fn truncate_error(error: &str) -> String {
    let trimmed = error.trim();
    let cut = truncate_chars(trimmed, MAX_ERROR_LENGTH);
    if cut.len() < trimmed.len() {
        format!("{}...", cut)
    } else {
        cut.to_string()
    }
}
