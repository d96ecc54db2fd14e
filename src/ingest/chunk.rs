//! Paragraph chunking with greedy word wrapping for long paragraphs.

/// Default maximum characters per chunk.
pub const DEFAULT_MAX_CHARS: usize = 800;

/// Split `text` on blank lines, then wrap any paragraph longer than
/// `max_chars` characters into segments of at most `max_chars` characters.
///
/// Empty paragraphs are dropped. Lengths are counted in `char`s.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        if paragraph.chars().count() <= max_chars {
            chunks.push(paragraph.to_string());
        } else {
            chunks.extend(wrap(paragraph, max_chars));
        }
    }

    chunks
}

/// Greedy word wrap. Whitespace runs collapse to one space and words longer
/// than `width` are split across lines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_len = 0usize;

    for word in text.split_whitespace() {
        let mut rest: Vec<char> = word.chars().collect();

        // The word fits on the current line after a separating space.
        if line_len > 0 && line_len + 1 + rest.len() <= width {
            line.push(' ');
            line.extend(rest.iter());
            line_len += 1 + rest.len();
            continue;
        }

        if line_len > 0 {
            if rest.len() <= width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            } else {
                // Fill what remains of the current line with the head of a long word.
                let room = width.saturating_sub(line_len + 1);
                if room > 0 {
                    line.push(' ');
                    line.extend(rest.drain(..room));
                }
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
        }

        while rest.len() > width {
            lines.push(rest.drain(..width).collect());
        }
        line.extend(rest.iter());
        line_len = rest.len();
    }

    if line_len > 0 {
        lines.push(line);
    }
    lines
}
