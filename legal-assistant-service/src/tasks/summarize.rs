use async_trait::async_trait;
use graph_flow::{Context, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::session_keys;
use crate::handlers::{DocumentSummarizer, HandlerOutcome};

pub struct SummarizeTask {
    summarizer: Arc<DocumentSummarizer>,
}

impl SummarizeTask {
    pub const ID: &'static str = "summarize";

    pub fn new(summarizer: Arc<DocumentSummarizer>) -> Self {
        Self { summarizer }
    }
}

#[async_trait]
impl Task for SummarizeTask {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = super::session_id(&context).await;
        let text: String = context
            .get(session_keys::DOCUMENT_TEXT)
            .await
            .unwrap_or_default();

        info!(session_id = %session_id, document_chars = text.chars().count(), "Summarizing uploaded document");

        let result = self.summarizer.summarize(&text).await;
        super::finish_turn(&context, HandlerOutcome::Summary(result)).await
    }
}
