use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::extract::DocumentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Chat transcript of a session, in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    entries: Vec<ChatEntry>,
}

impl ConversationHistory {
    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Category of a chat turn
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Summarize,
    /// Also the fallback for classifier output that matches no label
    #[default]
    LegalQuestion,
    DraftRequest,
}

impl Intent {
    pub const ALL: [Intent; 3] = [Intent::Summarize, Intent::LegalQuestion, Intent::DraftRequest];

    pub fn label(self) -> &'static str {
        match self {
            Intent::Summarize => "summarize",
            Intent::LegalQuestion => "legal_question",
            Intent::DraftRequest => "draft_request",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|intent| intent.label() == label)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Text of the most recent upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentState {
    pub filename: Option<String>,
    pub kind: DocumentKind,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
    pub draft_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: ChatEntry,
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<TurnDiagnostics>,
}

/// Extra turn data returned only when debug output is enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnDiagnostics {
    pub document_preview: String,
    pub raw_intent: Option<String>,
    pub turn_state: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub document_kind: DocumentKind,
    pub extracted_characters: usize,
    pub entries: Vec<ChatEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub document: Option<DocumentSummaryView>,
    pub index_ready: bool,
    pub history: Vec<ChatEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentSummaryView {
    pub filename: Option<String>,
    pub kind: DocumentKind,
    pub characters: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DraftResponse {
    pub draft_type: String,
    pub draft: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_keeps_pairs_in_order() {
        let mut history = ConversationHistory::default();
        for i in 0..5 {
            history.push(ChatEntry::user(format!("question {i}")));
            history.push(ChatEntry::assistant(format!("answer {i}")));
        }

        assert_eq!(history.len(), 10);
        for (i, pair) in history.entries().chunks(2).enumerate() {
            assert_eq!(pair[0], ChatEntry::user(format!("question {i}")));
            assert_eq!(pair[1], ChatEntry::assistant(format!("answer {i}")));
        }

        let json = serde_json::to_string(&history).unwrap();
        let back: ConversationHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries(), history.entries());

        history.clear();
        assert!(history.is_empty());
    }

    #[test]
    fn intent_labels() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(intent.label()), Some(intent));
            let json = serde_json::to_value(intent).unwrap();
            assert_eq!(json, serde_json::json!(intent.label()));
        }
        assert_eq!(Intent::from_label("Summarize"), None);
        assert_eq!(Intent::default(), Intent::LegalQuestion);
    }
}
