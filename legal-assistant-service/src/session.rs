use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{ConversationHistory, DocumentState};

/// Everything the service keeps for one user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub history: ConversationHistory,
    pub document: Option<DocumentState>,
}

impl LegalSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            history: ConversationHistory::default(),
            document: None,
        }
    }

    pub fn document_text(&self) -> Option<&str> {
        self.document.as_ref().map(|doc| doc.text.as_str())
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: LegalSession) -> anyhow::Result<()>;
    async fn get(&self, id: &str) -> anyhow::Result<Option<LegalSession>>;
    /// Returns whether a session was removed
    async fn delete(&self, id: &str) -> anyhow::Result<bool>;
}

/// In-memory implementation of SessionStore
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Arc<DashMap<String, LegalSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: LegalSession) -> anyhow::Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> anyhow::Result<Option<LegalSession>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.sessions.remove(id).is_some())
    }
}
