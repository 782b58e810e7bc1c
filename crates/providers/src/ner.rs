use crate::openai::check_status;
use crate::{NerProvider, ProviderError, TaggedEntity};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for a statistical NER service (e.g. a spaCy model behind HTTP).
///
/// `POST {url}/ner` with `{"text": ...}` must answer
/// `{"entities": [{"text", "start", "end", "label"}]}` using character offsets.
#[derive(Clone)]
pub struct HttpNerProvider {
    client: Client,
    url: String,
}

impl HttpNerProvider {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[derive(Deserialize)]
struct NerResponse {
    #[serde(default)]
    entities: Vec<TaggedEntity>,
}

#[async_trait::async_trait]
impl NerProvider for HttpNerProvider {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedEntity>, ProviderError> {
        #[derive(Serialize)]
        struct NerRequest<'a> {
            text: &'a str,
        }

        let url = format!("{}/ner", self.url.trim_end_matches('/'));
        let resp = self
            .client
            .post(url)
            .json(&NerRequest { text })
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = check_status(resp).await?;
        let parsed: NerResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(parsed.entities)
    }
}
