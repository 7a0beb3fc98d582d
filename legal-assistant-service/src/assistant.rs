//! Session and turn controller.
//!
//! Owns the per-session state (history, uploaded document, reference index)
//! and runs uploads and chat turns against it. Turns of one session are
//! serialized; different sessions proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::AssistantError;
use crate::extract::{DocumentKind, TextExtractor};
use crate::handlers::{DOCUMENT_READY_MESSAGE, DocumentSummarizer, DraftGenerator, render_summary};
use crate::llm::LanguageModel;
use crate::models::{
    ChatEntry, ChatResponse, DocumentState, DocumentSummaryView, DraftRequest, DraftResponse,
    SessionView, TurnDiagnostics, UploadResponse,
};
use crate::reference::ReferenceLibrary;
use crate::session::{LegalSession, SessionStore};
use crate::workflow::{LegalWorkflow, TurnInput};

/// Characters of the document shown in turn diagnostics
const DOCUMENT_PREVIEW_CHARS: usize = 200;

/// A document as received from the client
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

pub struct LegalAssistant {
    store: Arc<dyn SessionStore>,
    library: Arc<ReferenceLibrary>,
    workflow: LegalWorkflow,
    summarizer: DocumentSummarizer,
    drafts: DraftGenerator,
    extractor: TextExtractor,
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
    debug_transcript: bool,
}

impl LegalAssistant {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        store: Arc<dyn SessionStore>,
        library: Arc<ReferenceLibrary>,
        extractor: TextExtractor,
    ) -> graph_flow::Result<Self> {
        Ok(Self {
            workflow: LegalWorkflow::new(llm.clone(), library.clone())?,
            summarizer: DocumentSummarizer::new(llm.clone()),
            drafts: DraftGenerator::new(llm),
            store,
            library,
            extractor,
            turn_locks: DashMap::new(),
            debug_transcript: false,
        })
    }

    /// Attach turn diagnostics to chat responses
    pub fn with_debug_transcript(mut self, enabled: bool) -> Self {
        self.debug_transcript = enabled;
        self
    }

    pub async fn create_session(&self) -> Result<LegalSession, AssistantError> {
        let session = LegalSession::new(Uuid::new_v4().to_string());
        self.store.save(session.clone()).await?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }

    pub async fn session_view(&self, session_id: &str) -> Result<SessionView, AssistantError> {
        let session = self.load(session_id).await?;
        Ok(SessionView {
            index_ready: self.library.is_ready(session_id),
            document: session.document.as_ref().map(|doc| DocumentSummaryView {
                filename: doc.filename.clone(),
                kind: doc.kind,
                characters: doc.text.chars().count(),
            }),
            history: session.history.entries().to_vec(),
            session_id: session.id,
            created_at: session.created_at,
        })
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<ChatEntry>, AssistantError> {
        Ok(self.load(session_id).await?.history.entries().to_vec())
    }

    /// Empty the conversation; the document and index stay
    pub async fn clear_history(&self, session_id: &str) -> Result<(), AssistantError> {
        let (_guard, mut session) = self.lock_session(session_id).await?;
        session.history.clear();
        self.store.save(session).await?;
        info!(session_id = %session_id, "Conversation cleared");
        Ok(())
    }

    /// Tear the session down: history, document and reference index
    pub async fn reset(&self, session_id: &str) -> Result<(), AssistantError> {
        let (_guard, _) = self.lock_session(session_id).await?;

        let deleted = self.store.delete(session_id).await;
        self.library.evict(session_id);
        self.turn_locks.remove(session_id);
        if !deleted? {
            return Err(AssistantError::SessionNotFound(session_id.to_string()));
        }
        info!(session_id = %session_id, "Session reset");
        Ok(())
    }

    /// Extract, summarize and index an uploaded document.
    ///
    /// The summary entry is recorded before indexing starts, so an indexing
    /// failure still leaves it in the history.
    pub async fn upload(
        &self,
        session_id: &str,
        upload: DocumentUpload,
    ) -> Result<UploadResponse, AssistantError> {
        let (_guard, mut session) = self.lock_session(session_id).await?;
        let kind = DocumentKind::detect(upload.content_type.as_deref(), upload.filename.as_deref())?;
        info!(
            session_id = %session_id,
            ?kind,
            bytes = upload.bytes.len(),
            filename = upload.filename.as_deref().unwrap_or("unnamed"),
            "Processing uploaded document"
        );

        let text = self.extractor.extract(kind, upload.bytes).await?;
        let extracted_characters = text.chars().count();

        let summary = render_summary(&self.summarizer.summarize(&text).await);
        let first_entry = session.history.len();
        session.history.push(ChatEntry::assistant(summary));
        session.document = Some(DocumentState {
            filename: upload.filename,
            kind,
            text,
        });
        self.store.save(session.clone()).await?;

        if let Err(e) = self.library.index_for(session_id).await {
            error!(session_id = %session_id, error = %e, "Failed to index legal reference base");
            return Err(AssistantError::Reference(e.to_string()));
        }

        session.history.push(ChatEntry::assistant(DOCUMENT_READY_MESSAGE));
        self.store.save(session.clone()).await?;

        Ok(UploadResponse {
            session_id: session.id,
            document_kind: kind,
            extracted_characters,
            entries: session.history.entries()[first_entry..].to_vec(),
        })
    }

    /// Run one chat turn: exactly one user entry and one assistant entry
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse, AssistantError> {
        if message.trim().is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        let (_guard, mut session) = self.lock_session(session_id).await?;
        session.history.push(ChatEntry::user(message));

        let document_text = session.document_text().map(str::to_string);
        let output = self
            .workflow
            .run_turn(TurnInput {
                session_id: session_id.to_string(),
                message: message.to_string(),
                document_text: document_text.clone(),
            })
            .await;

        let reply = ChatEntry::assistant(output.reply);
        session.history.push(reply.clone());
        self.store.save(session).await?;

        let debug = self.debug_transcript.then(|| TurnDiagnostics {
            document_preview: document_text
                .as_deref()
                .map(|text| text.chars().take(DOCUMENT_PREVIEW_CHARS).collect())
                .unwrap_or_default(),
            raw_intent: output.raw_intent,
            turn_state: output.turn_state,
        });

        Ok(ChatResponse {
            session_id: session_id.to_string(),
            reply,
            intent: output.intent,
            debug,
        })
    }

    /// Structured drafting outside of any chat session
    pub async fn generate_draft(&self, request: DraftRequest) -> Result<DraftResponse, AssistantError> {
        let draft = self
            .drafts
            .generate(&request)
            .await
            .map_err(AssistantError::Draft)?;

        Ok(DraftResponse {
            draft_type: request.draft_type,
            draft,
        })
    }

    async fn load(&self, session_id: &str) -> Result<LegalSession, AssistantError> {
        self.store
            .get(session_id)
            .await?
            .ok_or_else(|| AssistantError::SessionNotFound(session_id.to_string()))
    }

    /// Serialize on the session's turn lock, then load it.
    ///
    /// Unknown ids never get a lock entry, and a session deleted while a
    /// caller waited drops the entry it left behind.
    async fn lock_session(
        &self,
        session_id: &str,
    ) -> Result<(OwnedMutexGuard<()>, LegalSession), AssistantError> {
        self.load(session_id).await?;

        let lock = self.turn_locks.entry(session_id.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        match self.load(session_id).await {
            Ok(session) => Ok((guard, session)),
            Err(e) => {
                self.turn_locks.remove(session_id);
                Err(e)
            }
        }
    }
}
