use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

/// Turns text into vectors for similarity search
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text; output order matches input order
    async fn embed(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Local ONNX embeddings via fastembed (all-MiniLM-L6-v2).
///
/// The model is loaded on first use and kept for the life of the process.
#[derive(Clone, Default)]
pub struct FastEmbedder {
    model: Arc<Mutex<Option<TextEmbedding>>>,
}

impl FastEmbedder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let count = texts.len();
        let slot = self.model.clone();

        // ONNX inference is CPU bound; keep it off the async workers
        let embeddings = tokio::task::spawn_blocking(move || {
            let mut guard = slot
                .lock()
                .map_err(|_| anyhow!("embedding model lock poisoned"))?;
            if guard.is_none() {
                info!("Loading embedding model AllMiniLML6V2");
                *guard = Some(TextEmbedding::try_new(
                    InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                        .with_show_download_progress(false),
                )?);
            }
            let model = guard
                .as_mut()
                .ok_or_else(|| anyhow!("embedding model unavailable"))?;
            let embeddings = model.embed(texts, None)?;
            Ok::<Vec<Vec<f32>>, anyhow::Error>(embeddings)
        })
        .await??;

        info!(count, dimension = embeddings.first().map(Vec::len).unwrap_or(0), "Embedded texts");
        Ok(embeddings)
    }
}
