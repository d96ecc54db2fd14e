pub mod index;
pub mod search;
pub mod stats;

/// Truncate `text` to at most `max` characters, appending `...` when cut.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
