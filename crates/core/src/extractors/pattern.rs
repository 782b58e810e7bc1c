use super::SpanExtractor;
use crate::models::{EntityType, Span};
use crate::text::CharMap;
use once_cell::sync::Lazy;
use regex::Regex;

struct LegalPattern {
    entity_type: EntityType,
    regex: Regex,
}

fn pattern(entity_type: EntityType, re: &str) -> Option<LegalPattern> {
    match Regex::new(re) {
        Ok(regex) => Some(LegalPattern { entity_type, regex }),
        Err(err) => {
            tracing::error!(label = %entity_type, error = %err, "invalid legal pattern");
            None
        }
    }
}

// Applied in this order; matches of every pattern are kept.
static PATTERNS: Lazy<Vec<LegalPattern>> = Lazy::new(|| {
    [
        (
            EntityType::CaseCitation,
            r"([A-Za-z\s]+\sv\.\s[A-Za-z\s]+)|(\d+\s[A-Za-z\.]+\s\d+)",
        ),
        (EntityType::Statute, r"([A-Za-z\.]+\s§\s\d+(?:\.\d+)?)"),
        (EntityType::Money, r"\$\d+(?:,\d+)*(?:\.\d+)?"),
        (
            EntityType::Date,
            r"\d{1,2}/\d{1,2}/\d{2,4}|\d{1,2}-\d{1,2}-\d{2,4}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]* \d{1,2},? \d{4}",
        ),
    ]
    .into_iter()
    .filter_map(|(label, re)| pattern(label, re))
    .collect()
});

/// Citations, statutes, amounts and dates found by regular expression.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn find(&self, text: &str) -> Vec<Span> {
        let map = CharMap::new(text);
        let mut spans = Vec::new();
        for p in PATTERNS.iter() {
            for m in p.regex.find_iter(text) {
                spans.push(Span::new(
                    m.as_str(),
                    map.to_char(m.start()),
                    map.to_char(m.end()),
                    p.entity_type.clone(),
                ));
            }
        }
        spans
    }
}

#[async_trait::async_trait]
impl SpanExtractor for PatternExtractor {
    fn name(&self) -> &str {
        "patterns"
    }

    async fn extract_spans(&self, text: &str) -> anyhow::Result<Vec<Span>> {
        Ok(self.find(text))
    }
}
