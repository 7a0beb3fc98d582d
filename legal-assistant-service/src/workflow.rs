use std::sync::Arc;

use graph_flow::{Graph, GraphBuilder};
use serde_json::{Map, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::handlers::{
    DocumentSummarizer, DraftGenerator, LegalQuestionAnswerer, NO_RESPONSE_MESSAGE,
    render_turn_failure,
};
use crate::intent::IntentClassifier;
use crate::llm::LanguageModel;
use crate::models::Intent;
use crate::reference::ReferenceLibrary;
use crate::tasks::*;

/// Classification followed by exactly one handler, picked by intent label
pub fn build_legal_workflow(
    llm: Arc<dyn LanguageModel>,
    library: Arc<ReferenceLibrary>,
) -> graph_flow::Result<Graph> {
    let classify = Arc::new(ClassifyIntentTask::new(Arc::new(IntentClassifier::new(llm.clone()))));
    let summarize = Arc::new(SummarizeTask::new(Arc::new(DocumentSummarizer::new(llm.clone()))));
    let legal_qa = Arc::new(LegalQaTask::new(Arc::new(LegalQuestionAnswerer::new(
        llm.clone(),
        library,
    ))));
    let draft = Arc::new(DraftDocumentTask::new(Arc::new(DraftGenerator::new(llm))));

    let routes = Intent::ALL.map(|intent| (intent.label(), task_for(intent)));

    GraphBuilder::new("legal_assistant")
        .add_task(classify)
        .add_task(summarize)
        .add_task(legal_qa)
        .add_task(draft)
        .set_start_task(ClassifyIntentTask::ID)
        .add_routed_edges(
            ClassifyIntentTask::ID,
            |context| {
                context
                    .get_sync::<Intent>(session_keys::INTENT)
                    .map(|intent| intent.label().to_string())
            },
            routes,
        )
        .build()
}

fn task_for(intent: Intent) -> &'static str {
    match intent {
        Intent::Summarize => SummarizeTask::ID,
        Intent::LegalQuestion => LegalQaTask::ID,
        Intent::DraftRequest => DraftDocumentTask::ID,
    }
}

/// Inputs of one chat turn
#[derive(Debug, Clone)]
pub struct TurnInput {
    pub session_id: String,
    pub message: String,
    pub document_text: Option<String>,
}

/// What a chat turn produced
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub reply: String,
    pub intent: Option<Intent>,
    pub raw_intent: Option<String>,
    /// Final contents of the turn context
    pub turn_state: Map<String, Value>,
}

/// Runs chat turns through the legal assistant graph
pub struct LegalWorkflow {
    graph: Arc<Graph>,
}

impl LegalWorkflow {
    pub fn new(llm: Arc<dyn LanguageModel>, library: Arc<ReferenceLibrary>) -> graph_flow::Result<Self> {
        Ok(Self {
            graph: Arc::new(build_legal_workflow(llm, library)?),
        })
    }

    /// Execute one turn on a fresh context. Never fails: errors escaping the
    /// graph are rendered into the reply.
    pub async fn run_turn(&self, input: TurnInput) -> TurnOutput {
        let mut session = self.graph.start_session(Uuid::new_v4().to_string());
        let context = session.context.clone();

        let seeded = async {
            context.set(session_keys::SESSION_ID, &input.session_id).await?;
            context.set(session_keys::INPUT, &input.message).await?;
            if let Some(text) = &input.document_text {
                context.set(session_keys::DOCUMENT_TEXT, text).await?;
            }
            Ok::<(), graph_flow::GraphError>(())
        };

        let executed = match seeded.await {
            Ok(()) => self.graph.execute_session(&mut session).await,
            Err(e) => Err(e),
        };

        let reply = match executed {
            Ok(result) => {
                info!(
                    session_id = %input.session_id,
                    task_id = %result.task_id,
                    status = ?result.status,
                    "Turn completed"
                );
                result
                    .response
                    .filter(|response| !response.trim().is_empty())
                    .unwrap_or_else(|| NO_RESPONSE_MESSAGE.to_string())
            }
            Err(e) => {
                error!(session_id = %input.session_id, error = %e, "Turn failed");
                render_turn_failure(&e)
            }
        };

        TurnOutput {
            reply,
            intent: context.get_sync(session_keys::INTENT),
            raw_intent: context.get_sync(session_keys::RAW_INTENT),
            turn_state: context.snapshot(),
        }
    }
}
