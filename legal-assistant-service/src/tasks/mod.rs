// Chat turn tasks
pub mod classify_intent;
pub mod draft_document;
pub mod legal_qa;
pub mod summarize;

pub use classify_intent::ClassifyIntentTask;
pub use draft_document::DraftDocumentTask;
pub use legal_qa::LegalQaTask;
pub use summarize::SummarizeTask;

use graph_flow::{Context, NextAction, Result, TaskResult};

use crate::handlers::HandlerOutcome;

/// Keys of the per-turn context
pub mod session_keys {
    pub const SESSION_ID: &str = "session_id";
    pub const INPUT: &str = "input";
    pub const DOCUMENT_TEXT: &str = "document_text";
    pub const INTENT: &str = "intent";
    pub const RAW_INTENT: &str = "raw_intent";
    pub const OUTCOME: &str = "outcome";
}

pub(crate) async fn session_id(context: &Context) -> String {
    context
        .get::<String>(session_keys::SESSION_ID)
        .await
        .unwrap_or_else(|| "unknown".to_string())
}

/// Store the handler outcome and end the turn with its rendering
pub(crate) async fn finish_turn(context: &Context, outcome: HandlerOutcome) -> Result<TaskResult> {
    let reply = outcome.render();
    context.set(session_keys::OUTCOME, &outcome).await?;
    Ok(TaskResult::new(Some(reply), NextAction::End))
}
