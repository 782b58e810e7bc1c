use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity label. The set is open: anything unrecognised is kept as `Other`
/// and ranks with the lowest priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    CaseCitation,
    Statute,
    Law,
    LegalTerm,
    Judge,
    Court,
    Jurisdiction,
    Party,
    Person,
    Org,
    Gpe,
    Date,
    Money,
    Regulation,
    Other(String),
}

impl EntityType {
    /// Parses a label; matching is case-insensitive and treats spaces and
    /// dashes as underscores.
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "CASE_CITATION" => EntityType::CaseCitation,
            "STATUTE" => EntityType::Statute,
            "LAW" => EntityType::Law,
            "LEGAL_TERM" => EntityType::LegalTerm,
            "JUDGE" => EntityType::Judge,
            "COURT" => EntityType::Court,
            "JURISDICTION" => EntityType::Jurisdiction,
            "PARTY" => EntityType::Party,
            "PERSON" => EntityType::Person,
            "ORG" => EntityType::Org,
            "GPE" => EntityType::Gpe,
            "DATE" => EntityType::Date,
            "MONEY" => EntityType::Money,
            "REGULATION" => EntityType::Regulation,
            _ => EntityType::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EntityType::CaseCitation => "CASE_CITATION",
            EntityType::Statute => "STATUTE",
            EntityType::Law => "LAW",
            EntityType::LegalTerm => "LEGAL_TERM",
            EntityType::Judge => "JUDGE",
            EntityType::Court => "COURT",
            EntityType::Jurisdiction => "JURISDICTION",
            EntityType::Party => "PARTY",
            EntityType::Person => "PERSON",
            EntityType::Org => "ORG",
            EntityType::Gpe => "GPE",
            EntityType::Date => "DATE",
            EntityType::Money => "MONEY",
            EntityType::Regulation => "REGULATION",
            EntityType::Other(label) => label,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EntityType {
    fn from(label: &str) -> Self {
        EntityType::parse(label)
    }
}

impl From<String> for EntityType {
    fn from(label: String) -> Self {
        EntityType::parse(&label)
    }
}

impl From<EntityType> for String {
    fn from(t: EntityType) -> Self {
        t.as_str().to_string()
    }
}

/// A candidate entity occurrence. `start`/`end` are half-open character
/// offsets into the original, unmodified document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl Span {
    pub fn new(
        text: impl Into<String>,
        start: usize,
        end: usize,
        entity_type: impl Into<EntityType>,
    ) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            entity_type: entity_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `start >= end`: a contract violation by the producing extractor.
    pub fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        ranges_overlap(self.start, self.end, other.start, other.end)
    }
}

/// Half-open range intersection: NOT (end1 <= start2 OR start1 >= end2).
pub fn ranges_overlap(start1: usize, end1: usize, start2: usize, end2: usize) -> bool {
    !(end1 <= start2 || start1 >= end2)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [EntityType; 14] = [
        EntityType::Person,
        EntityType::Org,
        EntityType::Gpe,
        EntityType::Date,
        EntityType::Money,
        EntityType::Law,
        EntityType::Court,
        EntityType::Judge,
        EntityType::Statute,
        EntityType::Regulation,
        EntityType::CaseCitation,
        EntityType::LegalTerm,
        EntityType::Party,
        EntityType::Jurisdiction,
    ];

    #[test]
    fn labels_parse_and_render() {
        for t in KNOWN.iter() {
            assert_eq!(&EntityType::parse(t.as_str()), t);
        }
        assert_eq!(EntityType::parse("case citation"), EntityType::CaseCitation);
        assert_eq!(EntityType::parse(" legal-term "), EntityType::LegalTerm);
        assert_eq!(
            EntityType::parse("CONTRACT_CLAUSE"),
            EntityType::Other("CONTRACT_CLAUSE".into())
        );
    }

    #[test]
    fn span_serializes_with_type_field() {
        let span = Span::new("Acme Corp", 0, 9, "ORG");
        let json = serde_json::to_value(&span).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "text": "Acme Corp", "start": 0, "end": 9, "type": "ORG" })
        );
        let back: Span = serde_json::from_value(json).unwrap();
        assert_eq!(back, span);
    }

    #[test]
    fn overlap_is_half_open() {
        let a = Span::new("abcd", 0, 4, "DATE");
        let b = Span::new("efgh", 4, 8, "DATE");
        let c = Span::new("de", 3, 5, "DATE");
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn degenerate_spans() {
        assert!(Span::new("", 3, 3, "ORG").is_degenerate());
        assert!(Span::new("", 5, 3, "ORG").is_degenerate());
        assert!(!Span::new("a", 3, 4, "ORG").is_degenerate());
    }
}
