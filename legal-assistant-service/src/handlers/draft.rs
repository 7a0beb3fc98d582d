use std::sync::Arc;

use tracing::info;

use crate::error::HandlerError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::models::DraftRequest;

/// Document types offered by the draft form; other labels are accepted too
pub const DRAFT_TYPES: [&str; 4] = [
    "Cease and Desist",
    "Legal Notice",
    "Employment Agreement",
    "Service Contract",
];

/// Draft type used for drafting requests that arrive through chat
pub const CHAT_DRAFT_TYPE: &str = "legal document";

pub const MISSING_FIELD: &str = "Not provided";
pub const DEFAULT_JURISDICTION: &str = "Saudi Arabia";

/// Form field keys with their prompt labels, in prompt order
pub const DRAFT_FIELDS: [(&str, &str); 15] = [
    ("company-name", "Your Company Name"),
    ("company-address", "Your Company Address"),
    ("city", "City"),
    ("state", "State"),
    ("zip-code", "Zip Code"),
    ("email-address", "Email Address"),
    ("phone-number", "Phone Number"),
    ("date", "Date"),
    ("client_name", "Client Name"),
    ("client-address", "Client's Address"),
    ("name", "Your Name"),
    ("position", "Your Position"),
    ("opposing_party", "Opposing Party"),
    ("reason", "Reason for Draft"),
    ("jurisdiction", "Jurisdiction"),
];

pub struct DraftGenerator {
    llm: Arc<dyn LanguageModel>,
}

impl DraftGenerator {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn generate(&self, request: &DraftRequest) -> Result<String, HandlerError> {
        info!(
            draft_type = %request.draft_type,
            provided_fields = request.fields.len(),
            "Generating legal draft"
        );

        let completion = CompletionRequest::new(draft_prompt(request)).with_temperature(0.4);
        self.llm
            .complete(completion)
            .await
            .map_err(HandlerError::completion)
    }

    /// Drafting request built from a free-text chat message
    pub fn chat_request(message: &str) -> DraftRequest {
        DraftRequest {
            draft_type: CHAT_DRAFT_TYPE.to_string(),
            fields: [("reason".to_string(), message.to_string())].into(),
        }
    }
}

pub fn draft_prompt(request: &DraftRequest) -> String {
    let details = DRAFT_FIELDS
        .iter()
        .map(|(key, label)| {
            let value = request
                .fields
                .get(*key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or(match *key {
                    "jurisdiction" => DEFAULT_JURISDICTION,
                    _ => MISSING_FIELD,
                });
            format!("- {label}: {value}")
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a legal assistant. Your task is to draft a {draft_type} using the information provided.

Details:
{details}

Ensure the tone is professional and compliant with Saudi labor law. Format the output as a complete, formal legal draft.",
        draft_type = request.draft_type
    )
}
