//! Telegram message text utilities
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Added HTML escaping for user-supplied text
//! - 1.0.0: Line-aware chunking for the sendMessage length limit

/// Telegram sendMessage text limit (characters)
pub const MESSAGE_LIMIT: usize = 4096;

/// Split text into pieces of at most `max_chars` characters.
///
/// Prefers splitting at newlines and falls back to character splitting for
/// lines that are longer than the limit on their own. Never splits inside a
/// UTF-8 character. Measured in characters because Telegram counts characters,
/// not bytes.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count() + 1;
        if current_len + line_len > max_chars {
            if !current.is_empty() {
                let chunk = current.trim_end();
                if !chunk.is_empty() {
                    chunks.push(chunk.to_string());
                }
                current.clear();
                current_len = 0;
            }
            if line_len > max_chars {
                chunks.extend(chunk_long_line(line, max_chars));
                continue;
            }
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len;
    }
    if !current.trim_end().is_empty() {
        chunks.push(current.trim_end().to_string());
    }
    chunks
}

fn chunk_long_line(line: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    chars
        .chunks(max_chars.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}

/// Chunk text for a single sendMessage call
pub fn chunk_for_message(text: &str) -> Vec<String> {
    chunk_text(text, MESSAGE_LIMIT)
}

/// Escape text for Telegram's HTML parse mode
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_no_chunk() {
        assert_eq!(chunk_text("hello", 100), vec!["hello"]);
    }

    #[test]
    fn test_chunks_on_line_boundaries() {
        let text = "line one\nline two\nline three";
        let chunks = chunk_text(text, 18);
        assert_eq!(chunks, vec!["line one\nline two", "line three"]);
    }

    #[test]
    fn test_long_line_split_by_chars() {
        let text = "ab".repeat(10);
        let chunks = chunk_text(&text, 6);
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.chars().count() <= 6));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_leading_blank_lines_produce_no_empty_chunk() {
        let text = format!("\n\n{}", "x".repeat(20));
        let chunks = chunk_text(&text, 10);
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10)]);
    }

    #[test]
    fn test_cyrillic_counts_chars_not_bytes() {
        // 10 Cyrillic chars = 20 bytes, still fits a 10-char limit
        let text = "привітання";
        assert_eq!(chunk_text(text, 10), vec![text]);
    }

    #[test]
    fn test_message_limit_chunks() {
        let line = "x".repeat(100);
        let text = vec![line; 50].join("\n");
        let chunks = chunk_for_message(&text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= MESSAGE_LIMIT));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("plain"), "plain");
    }
}
