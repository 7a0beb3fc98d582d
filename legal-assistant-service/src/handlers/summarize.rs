use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HandlerError;
use crate::llm::{CompletionRequest, LanguageModel};

/// Hard bound on how much of the document reaches the prompt
pub const SUMMARY_CHAR_LIMIT: usize = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Summary {
    /// There was no document text to summarize
    NoDocument,
    Generated(String),
}

pub struct DocumentSummarizer {
    llm: Arc<dyn LanguageModel>,
}

impl DocumentSummarizer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn summarize(&self, text: &str) -> Result<Summary, HandlerError> {
        if text.trim().is_empty() {
            info!("No document text available, skipping summary");
            return Ok(Summary::NoDocument);
        }

        let excerpt = truncate_chars(text, SUMMARY_CHAR_LIMIT);
        info!(
            document_chars = text.chars().count(),
            excerpt_chars = excerpt.chars().count(),
            "Summarizing document"
        );

        let request = CompletionRequest::new(summary_prompt(excerpt)).with_temperature(0.0);
        let summary = self
            .llm
            .complete(request)
            .await
            .map_err(HandlerError::completion)?;
        Ok(Summary::Generated(summary))
    }
}

fn summary_prompt(document: &str) -> String {
    format!(
        "You are a legal assistant. The user has uploaded a legal document.
Your job is to:
- Summarize the document in simple terms
- Highlight any legal risks or unusual clauses
- Format your response in two sections:
    1. Summary
    2. Risks / Red Flags

Document:
{document}"
    )
}

/// Prefix of `text` holding at most `limit` characters
pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
