use crate::analysis::{format_key_information, DocumentAnalysis};
use providers::{CompletionRequest, LlmProvider, ProviderError};
use serde::{Deserialize, Serialize};

const ASSISTANT_SYSTEM: &str = "You are a legal assistant specializing in document analysis and \
legal research. Provide clear, accurate and helpful responses to questions about legal documents.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

fn document_info(analysis: &DocumentAnalysis) -> String {
    let mut info = format!(
        "Document Type: {}\nDocument Type Explanation: {}\n\n",
        analysis.document_type.document_type, analysis.document_type.explanation
    );
    if !analysis.key_information.is_empty() {
        info.push_str("Document Key Information:\n");
        info.push_str(&format_key_information(&analysis.key_information));
    }
    info
}

/// Answers a question about the active document from retrieved context.
pub async fn answer(
    question: &str,
    context: &str,
    analysis: Option<&DocumentAnalysis>,
    llm: &dyn LlmProvider,
) -> Result<String, ProviderError> {
    let info = analysis.map(document_info).unwrap_or_default();
    let prompt = format!(
        "You are a legal assistant specializing in document analysis and legal research.\n\n\
         Document Context:\n{context}\n\n\
         {info}\n\
         User Question: {question}\n\n\
         Please provide a detailed and accurate response to the user's question based on the \
         document context. If the answer cannot be determined from the provided context, \
         acknowledge this limitation and provide general legal information that might still be \
         helpful. Cite specific sections or clauses from the document when relevant."
    );
    let request = CompletionRequest::new(prompt)
        .with_system(ASSISTANT_SYSTEM)
        .max_tokens(1000)
        .temperature(0.2);
    llm.complete(&request).await
}

/// General legal information with no document attached.
pub async fn general_information(
    query: &str,
    llm: &dyn LlmProvider,
) -> Result<String, ProviderError> {
    let prompt = format!(
        "You are a legal assistant with expertise in various legal domains.\n\n\
         User Query: {query}\n\n\
         Please provide helpful general legal information related to this query. \
         Make it clear that this is general information and not specific legal advice. \
         Include a disclaimer about consulting a qualified attorney for specific legal matters."
    );
    let request = CompletionRequest::new(prompt).max_tokens(800).temperature(0.3);
    llm.complete(&request).await
}
