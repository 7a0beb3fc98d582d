use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::info;

use super::{Chunk, ReferenceIndex, ScoredChunk, TextSplitter};
use crate::embedding::Embedder;

type IndexSlot = Arc<OnceCell<Arc<ReferenceIndex>>>;

/// Owns the reference corpus and the per-session indexes built from it.
///
/// Each session gets its own index, built at most once and kept until the
/// session is torn down.
pub struct ReferenceLibrary {
    corpus_path: PathBuf,
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
    slots: DashMap<String, IndexSlot>,
}

impl ReferenceLibrary {
    pub fn new(corpus_path: impl Into<PathBuf>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            corpus_path: corpus_path.into(),
            embedder,
            splitter: TextSplitter::default(),
            slots: DashMap::new(),
        }
    }

    /// The session's index, building it on first use
    pub async fn index_for(&self, session_id: &str) -> anyhow::Result<Arc<ReferenceIndex>> {
        let slot = self.slots.entry(session_id.to_string()).or_default().clone();
        let index = slot
            .get_or_try_init(|| async {
                info!(session_id = %session_id, "Indexing legal reference base");
                self.build_index().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(index))
    }

    pub fn is_ready(&self, session_id: &str) -> bool {
        self.slots
            .get(session_id)
            .is_some_and(|slot| slot.initialized())
    }

    pub fn evict(&self, session_id: &str) {
        if self.slots.remove(session_id).is_some() {
            info!(session_id = %session_id, "Dropped reference index");
        }
    }

    /// Top `k` chunks for `query` from the session's index
    pub async fn search(&self, session_id: &str, query: &str, k: usize) -> anyhow::Result<Vec<ScoredChunk>> {
        let index = self.index_for(session_id).await?;
        let query_vector = self
            .embedder
            .embed(vec![query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("embedder returned no vector for the query"))?;
        Ok(index.search(&query_vector, k)?)
    }

    async fn build_index(&self) -> anyhow::Result<ReferenceIndex> {
        let raw_text = tokio::fs::read_to_string(&self.corpus_path)
            .await
            .with_context(|| {
                format!("failed to read reference corpus {}", self.corpus_path.display())
            })?;

        let source = self
            .corpus_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let texts = self.splitter.split(&raw_text);
        let embeddings = self.embedder.embed(texts.clone()).await?;
        let chunks = texts
            .into_iter()
            .map(|text| Chunk {
                text,
                source: source.clone(),
            })
            .collect();

        let index = ReferenceIndex::new(chunks, embeddings)?;
        info!(
            chunks = index.len(),
            dimension = index.dimension(),
            corpus = %self.corpus_path.display(),
            "Reference index built"
        );
        Ok(index)
    }
}
