use async_trait::async_trait;
use graph_flow::{Context, GraphError, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::session_keys;
use crate::handlers::{HandlerOutcome, LegalQuestionAnswerer};

/// Answers the turn's question from the session's reference index
pub struct LegalQaTask {
    answerer: Arc<LegalQuestionAnswerer>,
}

impl LegalQaTask {
    pub const ID: &'static str = "legal_qa";

    pub fn new(answerer: Arc<LegalQuestionAnswerer>) -> Self {
        Self { answerer }
    }
}

#[async_trait]
impl Task for LegalQaTask {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = super::session_id(&context).await;
        let question: String = context
            .get(session_keys::INPUT)
            .await
            .ok_or_else(|| GraphError::ContextError("input not found".to_string()))?;

        info!(session_id = %session_id, task_id = %self.id(), "Answering legal question");

        let result = self.answerer.answer(&session_id, &question).await;
        if let Ok(answer) = &result {
            info!(session_id = %session_id, sources = answer.sources.len(), "Legal answer ready");
        }
        super::finish_turn(&context, HandlerOutcome::LegalAnswer(result)).await
    }
}
