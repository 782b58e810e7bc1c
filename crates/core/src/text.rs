//! Character-offset helpers. Rust strings index by byte; everything this
//! crate exposes counts Unicode scalar values.

/// Maps byte offsets of a document to character offsets and back.
#[derive(Debug, Clone)]
pub struct CharMap {
    /// Byte offset of every char start, plus the total byte length.
    boundaries: Vec<usize>,
}

impl CharMap {
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Character offset of a byte offset that lies on a char boundary.
    /// Offsets inside a multi-byte char map to the char containing them.
    pub fn to_char(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// Byte offset of a character offset, clamped to the text length.
    pub fn to_byte(&self, ch: usize) -> usize {
        self.boundaries[ch.min(self.char_len())]
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

/// Slice by character offsets, clamped to the text.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let map = CharMap::new(text);
    let end = end.min(map.char_len());
    let start = start.min(end);
    &text[map.to_byte(start)..map.to_byte(end)]
}

/// Preview of at most `max_chars` characters cut at the last space, with
/// an ellipsis when anything was dropped.
pub fn truncate_words(text: &str, max_chars: usize) -> String {
    let head = truncate_chars(text, max_chars);
    if head.len() == text.len() {
        return text.to_string();
    }
    match head.rfind(' ') {
        Some(space) => format!("{}...", &head[..space]),
        None => format!("{head}..."),
    }
}
