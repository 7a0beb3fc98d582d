use std::sync::Arc;

use tracing::{info, warn};

use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::Intent;

/// Result of classifying one chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// The classifier's reply as received
    pub raw: String,
}

/// Asks the completion endpoint which category a chat message belongs to
pub struct IntentClassifier {
    llm: Arc<dyn LanguageModel>,
}

impl IntentClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, message: &str) -> anyhow::Result<Classification> {
        let request = CompletionRequest::new(classification_prompt(message)).with_temperature(0.1);
        let raw = self.llm.complete(request).await?;
        let intent = normalize_intent(&raw);
        info!(intent = %intent, raw_intent = %raw.trim(), "Classified user intent");

        Ok(Classification { intent, raw })
    }
}

fn classification_prompt(message: &str) -> String {
    format!(
        r#"Analyze the following user request and classify it into one of these categories:
- "summarize": User wants a summary or analysis of a document
- "legal_question": User is asking a legal question that needs research
- "draft_request": User wants to draft or generate a legal document

User request: "{message}"

Respond with only the classification category (summarize, legal_question, or draft_request)."#
    )
}

/// Maps a classifier reply to an intent. Only surrounding whitespace and case
/// are forgiven; anything else falls back to a legal question.
pub fn normalize_intent(raw: &str) -> Intent {
    let label = raw.trim().to_lowercase();
    match Intent::from_label(&label) {
        Some(intent) => intent,
        None => {
            warn!(raw_intent = %label, "Unrecognized classifier output, treating as legal question");
            Intent::default()
        }
    }
}
