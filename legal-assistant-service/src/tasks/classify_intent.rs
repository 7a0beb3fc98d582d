use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Result, Task, TaskResult};
use std::sync::Arc;
use tracing::info;

use super::session_keys;
use crate::intent::IntentClassifier;

/// Entry task: labels the turn with one intent
pub struct ClassifyIntentTask {
    classifier: Arc<IntentClassifier>,
}

impl ClassifyIntentTask {
    pub const ID: &'static str = "classify_intent";

    pub fn new(classifier: Arc<IntentClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Task for ClassifyIntentTask {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn run(&self, context: Context) -> Result<TaskResult> {
        let session_id = super::session_id(&context).await;
        let input: String = context
            .get(session_keys::INPUT)
            .await
            .ok_or_else(|| GraphError::ContextError("input not found".to_string()))?;

        info!(session_id = %session_id, task_id = %self.id(), "Classifying user intent");

        let classification = self
            .classifier
            .classify(&input)
            .await
            .map_err(|e| GraphError::TaskExecutionFailed(e.to_string()))?;

        context.set(session_keys::INTENT, classification.intent).await?;
        context.set(session_keys::RAW_INTENT, &classification.raw).await?;

        Ok(TaskResult::new_with_status(
            None,
            NextAction::ContinueAndExecute,
            Some(format!("Intent classified as {}", classification.intent)),
        ))
    }
}
