//! Scripted stand-ins for the completion endpoint and the embedder.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use async_trait::async_trait;

use crate::embedding::Embedder;
use crate::llm::{CompletionRequest, LanguageModel};

type Reply = Result<String, String>;

/// Answers with the first rule whose needle appears in the prompt
pub(crate) struct ScriptedModel {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new(fallback: &str) -> Self {
        Self {
            rules: Vec::new(),
            fallback: Ok(fallback.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), Ok(reply.to_string())));
        self
    }

    pub fn failing_on(mut self, needle: &str, error: &str) -> Self {
        self.rules.push((needle.to_string(), Err(error.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> anyhow::Result<String> {
        let haystack = request.prompt.clone();
        self.requests.lock().unwrap().push(request);

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| haystack.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback);
        reply.clone().map_err(|e| anyhow!(e))
    }
}

const VOCABULARY: [&str; 8] = [
    "termination",
    "compensation",
    "wages",
    "hours",
    "leave",
    "contract",
    "confidential",
    "notice",
];

/// Bag-of-keywords vectors with a constant bias term so no vector is zero
#[derive(Default)]
pub(crate) struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .chain(std::iter::once(1.0))
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Embedder whose every call fails
pub(crate) struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: Vec<String>) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow!("embedding service unavailable"))
    }
}
