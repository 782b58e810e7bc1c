use super::SpanExtractor;
use crate::models::{EntityType, Span};
use providers::NerProvider;
use std::sync::Arc;

/// Labels kept from a general-purpose tagger; its other labels are noise
/// for legal text.
pub const TAGGER_LABELS: [EntityType; 5] = [
    EntityType::Person,
    EntityType::Org,
    EntityType::Gpe,
    EntityType::Date,
    EntityType::Money,
];

pub struct TaggerExtractor {
    provider: Arc<dyn NerProvider>,
}

impl TaggerExtractor {
    pub fn new(provider: Arc<dyn NerProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl SpanExtractor for TaggerExtractor {
    fn name(&self) -> &str {
        "tagger"
    }

    async fn extract_spans(&self, text: &str) -> anyhow::Result<Vec<Span>> {
        let tagged = self.provider.tag(text).await?;
        Ok(tagged
            .into_iter()
            .filter_map(|t| {
                let label = EntityType::parse(&t.label);
                TAGGER_LABELS
                    .contains(&label)
                    .then(|| Span::new(t.text, t.start, t.end, label))
            })
            .collect())
    }
}
