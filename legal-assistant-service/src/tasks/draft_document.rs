use async_trait::async_trait;
use graph_flow::{Context, GraphError, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::session_keys;
use crate::handlers::{DraftGenerator, HandlerOutcome};

pub struct DraftDocumentTask {
    generator: Arc<DraftGenerator>,
}

impl DraftDocumentTask {
    pub const ID: &'static str = "draft_document";

    pub fn new(generator: Arc<DraftGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Task for DraftDocumentTask {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = super::session_id(&context).await;
        let message: String = context
            .get(session_keys::INPUT)
            .await
            .ok_or_else(|| GraphError::ContextError("input not found".to_string()))?;

        info!(session_id = %session_id, task_id = %self.id(), "Drafting document from chat request");

        let request = DraftGenerator::chat_request(&message);
        let result = self.generator.generate(&request).await;
        super::finish_turn(&context, HandlerOutcome::Draft(result)).await
    }
}
