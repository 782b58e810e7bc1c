//! HTML rendering of a document with its entities highlighted.

use crate::models::{EntityType, Span};
use crate::text::CharMap;

const UNKNOWN_COLOR: &str = "#9E9E9E";

pub fn color_for(label: &EntityType) -> &'static str {
    match label {
        EntityType::Person => "#FFC107",
        EntityType::Org => "#2196F3",
        EntityType::Gpe => "#4CAF50",
        EntityType::Date => "#9C27B0",
        EntityType::Money => "#F44336",
        EntityType::Law => "#FF9800",
        EntityType::Court => "#795548",
        EntityType::Judge => "#607D8B",
        EntityType::Statute => "#E91E63",
        EntityType::Regulation => "#009688",
        EntityType::CaseCitation => "#673AB7",
        EntityType::LegalTerm => "#3F51B5",
        EntityType::Party => "#8BC34A",
        EntityType::Jurisdiction => "#00BCD4",
        EntityType::Other(_) => UNKNOWN_COLOR,
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '\n' => out.push_str("<br>"),
            c => out.push(c),
        }
    }
    out
}

/// Spans to draw: chosen from the last start backwards, skipping any that
/// overlap one already chosen or fall outside the text. Returned in
/// document order.
fn drawable(entities: &[Span], char_len: usize) -> Vec<&Span> {
    let mut by_start: Vec<&Span> = entities
        .iter()
        .filter(|e| !e.is_degenerate() && e.end <= char_len)
        .collect();
    by_start.sort_by(|a, b| b.start.cmp(&a.start));

    let mut chosen: Vec<&Span> = Vec::new();
    for e in by_start {
        if chosen.iter().all(|c| !e.overlaps(c)) {
            chosen.push(e);
        }
    }
    chosen.reverse();
    chosen
}

pub fn highlight_html(text: &str, entities: &[Span]) -> String {
    let map = CharMap::new(text);
    let mut body = String::new();
    let mut cursor = 0;
    for e in drawable(entities, map.char_len()) {
        let (start, end) = (map.to_byte(e.start), map.to_byte(e.end));
        body.push_str(&escape(&text[cursor..start]));
        body.push_str(&format!(
            "<span style=\"background-color: {}; padding: 2px; border-radius: 3px;\" title=\"{}\">{}</span>",
            color_for(&e.entity_type),
            escape(e.entity_type.as_str()),
            escape(&text[start..end]),
        ));
        cursor = end;
    }
    body.push_str(&escape(&text[cursor..]));
    format!(
        "<div style=\"font-family: monospace; white-space: pre-wrap; line-height: 1.5;\">{body}</div>"
    )
}
