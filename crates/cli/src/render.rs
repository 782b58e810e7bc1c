//! Terminal output.

use casefile_core::analysis::{format_key_information, DocumentAnalysis};
use casefile_core::extractors::SourceReport;
use casefile_core::Span;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

pub fn entity_counts(entities: &[Span]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for e in entities {
        *counts.entry(e.entity_type.to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn timestamp(secs: i64) -> String {
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| secs.to_string())
}

pub fn analysis(analysis: &DocumentAnalysis) -> String {
    let mut out = format!("Type: {}\n", analysis.document_type.document_type);
    if !analysis.document_type.explanation.is_empty() {
        out.push_str(&format!("      {}\n", analysis.document_type.explanation));
    }
    out.push_str(&format!("\nSummary:\n{}\n", analysis.summary.trim()));
    if !analysis.key_information.is_empty() {
        out.push_str("\nKey information:\n");
        out.push_str(&format_key_information(&analysis.key_information));
    }
    out
}

pub fn entities(entities: &[Span]) -> String {
    let mut out = String::new();
    for e in entities {
        out.push_str(&format!(
            "{:>6}..{:<6} {:<14} {}\n",
            e.start,
            e.end,
            e.entity_type.as_str(),
            e.text.replace('\n', " ")
        ));
    }
    let counts = entity_counts(entities)
        .into_iter()
        .map(|(label, n)| format!("{label}={n}"))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!("{} entities ({counts})\n", entities.len()));
    out
}

pub fn sources(sources: &[SourceReport]) -> String {
    sources
        .iter()
        .map(|s| match &s.error {
            Some(err) => format!("{}: failed ({err})", s.name),
            None => format!("{}: {} spans", s.name, s.spans),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_label() {
        let spans = vec![
            Span::new("a", 0, 1, "DATE"),
            Span::new("b", 2, 3, "PARTY"),
            Span::new("c", 4, 5, "DATE"),
        ];
        let counts = entity_counts(&spans);
        assert_eq!(counts["DATE"], 2);
        assert_eq!(counts["PARTY"], 1);
        assert!(entities(&spans).ends_with("3 entities (DATE=2, PARTY=1)\n"));
    }

    #[test]
    fn formats_epoch_seconds() {
        assert_eq!(timestamp(0), "1970-01-01 00:00");
    }
}
