//! Turn handlers and the rendering of their results into chat text.

pub mod draft;
pub mod legal_qa;
pub mod summarize;

use serde::{Deserialize, Serialize};

pub use draft::{DRAFT_TYPES, DraftGenerator};
pub use legal_qa::{LegalAnswer, LegalQuestionAnswerer};
pub use summarize::{DocumentSummarizer, Summary};

use crate::error::HandlerError;

pub const ERROR_MARKER: &str = "❌";
pub const NO_DOCUMENT_MESSAGE: &str = "❌ No document text provided for summarization.";
pub const EMPTY_SUMMARY_MESSAGE: &str = "⚠️ I couldn't generate a summary for this document.";
pub const EMPTY_ANSWER_MESSAGE: &str = "⚠️ I couldn't find an answer to your legal question.";
pub const EMPTY_DRAFT_MESSAGE: &str = "⚠️ I couldn't process your document drafting request.";
pub const NO_RESPONSE_MESSAGE: &str = "⚠️ No response generated.";
pub const DOCUMENT_READY_MESSAGE: &str = "✅ Document processed and ready for Q&A!";

/// What the handler of a turn produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "handler", content = "result", rename_all = "snake_case")]
pub enum HandlerOutcome {
    Summary(Result<Summary, HandlerError>),
    LegalAnswer(Result<LegalAnswer, HandlerError>),
    Draft(Result<String, HandlerError>),
}

impl HandlerOutcome {
    /// User-visible chat text for this outcome
    pub fn render(&self) -> String {
        match self {
            HandlerOutcome::Summary(result) => render_summary(result),
            HandlerOutcome::LegalAnswer(Ok(answer)) if answer.answer.trim().is_empty() => {
                EMPTY_ANSWER_MESSAGE.to_string()
            }
            HandlerOutcome::LegalAnswer(Ok(answer)) => {
                let sources = if answer.sources.is_empty() {
                    format!("• {}", legal_qa::UNKNOWN_SOURCE)
                } else {
                    answer
                        .sources
                        .iter()
                        .map(|source| format!("• {source}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                format!(
                    "⚖️ **Legal Analysis:**\n\n{}\n\n**Sources:**\n{sources}",
                    answer.answer
                )
            }
            HandlerOutcome::LegalAnswer(Err(e)) => {
                format!("{ERROR_MARKER} Error processing legal question: {e}")
            }
            HandlerOutcome::Draft(Ok(draft)) if draft.trim().is_empty() => {
                EMPTY_DRAFT_MESSAGE.to_string()
            }
            HandlerOutcome::Draft(Ok(draft)) => format!("📄 **Draft Generation:**\n\n{draft}"),
            HandlerOutcome::Draft(Err(e)) => {
                format!("{ERROR_MARKER} Error processing draft request: {e}")
            }
        }
    }
}

/// Chat text for a summary, shared by chat turns and uploads
pub fn render_summary(result: &Result<Summary, HandlerError>) -> String {
    match result {
        Ok(Summary::NoDocument) => NO_DOCUMENT_MESSAGE.to_string(),
        Ok(Summary::Generated(summary)) if summary.trim().is_empty() => {
            EMPTY_SUMMARY_MESSAGE.to_string()
        }
        Ok(Summary::Generated(summary)) => format!("📄 **Document Summary:**\n\n{summary}"),
        Err(e) => format!("{ERROR_MARKER} Error summarizing document: {e}"),
    }
}

/// Chat text for a turn that failed outside the handlers
pub fn render_turn_failure(error: impl std::fmt::Display) -> String {
    format!("{ERROR_MARKER} Error: {error}")
}
