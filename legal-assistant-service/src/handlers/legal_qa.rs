use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HandlerError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::reference::{ReferenceLibrary, ScoredChunk};

/// Number of reference chunks retrieved per question
pub const TOP_K: usize = 3;

/// Source label for chunks whose origin is unknown
pub const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalAnswer {
    pub answer: String,
    /// Distinct chunk sources, in retrieval order
    pub sources: Vec<String>,
}

/// Answers questions from the legal reference base of a session
pub struct LegalQuestionAnswerer {
    llm: Arc<dyn LanguageModel>,
    library: Arc<ReferenceLibrary>,
}

impl LegalQuestionAnswerer {
    pub fn new(llm: Arc<dyn LanguageModel>, library: Arc<ReferenceLibrary>) -> Self {
        Self { llm, library }
    }

    pub async fn answer(&self, session_id: &str, question: &str) -> Result<LegalAnswer, HandlerError> {
        let hits = self
            .library
            .search(session_id, question, TOP_K)
            .await
            .map_err(HandlerError::retrieval)?;
        info!(session_id = %session_id, retrieved = hits.len(), "Retrieved reference chunks");

        let request = CompletionRequest::new(qa_prompt(&hits, question)).with_temperature(0.1);
        let answer = self
            .llm
            .complete(request)
            .await
            .map_err(HandlerError::completion)?;

        Ok(LegalAnswer {
            answer,
            sources: distinct_sources(&hits),
        })
    }
}

fn qa_prompt(hits: &[ScoredChunk], question: &str) -> String {
    let context = hits
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Helpful Answer:"
    )
}

fn distinct_sources(hits: &[ScoredChunk]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    for hit in hits {
        let source = hit.chunk.source.as_deref().unwrap_or(UNKNOWN_SOURCE);
        if !sources.iter().any(|seen| seen == source) {
            sources.push(source.to_string());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Chunk;
    use crate::testing::{FailingEmbedder, KeywordEmbedder, ScriptedModel};
    use std::io::Write;

    fn hit(text: &str, source: Option<&str>) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                text: text.to_string(),
                source: source.map(str::to_string),
            },
            score: 1.0,
        }
    }

    fn corpus() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Article 74: the contract ends when both parties agree in writing.").unwrap();
        writeln!(file, "Article 77: termination without a valid reason entitles the worker to compensation.").unwrap();
        writeln!(file, "Article 98: working hours shall not exceed eight hours a day.").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn sources_are_deduplicated_in_order() {
        let hits = vec![
            hit("a", Some("labor_law.txt")),
            hit("b", None),
            hit("c", Some("labor_law.txt")),
            hit("d", Some("regulations.txt")),
            hit("e", None),
        ];
        assert_eq!(
            distinct_sources(&hits),
            vec!["labor_law.txt", UNKNOWN_SOURCE, "regulations.txt"]
        );
        assert!(distinct_sources(&[]).is_empty());
    }

    #[test]
    fn prompt_stuffs_context_before_question() {
        let prompt = qa_prompt(&[hit("first", None), hit("second", None)], "Can I be fired?");
        assert!(prompt.starts_with("Use the following pieces of context"));
        assert!(prompt.contains("first\n\nsecond\n\nQuestion: Can I be fired?\nHelpful Answer:"));
    }

    #[tokio::test]
    async fn answers_from_retrieved_chunks() {
        let file = corpus();
        let library = Arc::new(ReferenceLibrary::new(file.path(), Arc::new(KeywordEmbedder::default())));
        let model = Arc::new(ScriptedModel::new("Yes, under Article 77 you may claim compensation."));
        let qa = LegalQuestionAnswerer::new(model.clone(), library.clone());

        let answer = qa
            .answer("s1", "What compensation applies after termination?")
            .await
            .unwrap();

        assert_eq!(answer.answer, "Yes, under Article 77 you may claim compensation.");
        let expected_source = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(answer.sources, vec![expected_source]);
        assert!(library.is_ready("s1"));

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Article 77"));
        assert_eq!(requests[0].temperature, 0.1);
    }

    #[tokio::test]
    async fn retrieval_failure_skips_the_model() {
        let file = corpus();
        let library = Arc::new(ReferenceLibrary::new(file.path(), Arc::new(FailingEmbedder)));
        let model = Arc::new(ScriptedModel::new("unused"));
        let qa = LegalQuestionAnswerer::new(model.clone(), library);

        let err = qa.answer("s1", "Is overtime paid?").await.unwrap_err();
        assert_eq!(err, HandlerError::Retrieval("embedding service unavailable".to_string()));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn completion_failure_is_returned() {
        let file = corpus();
        let library = Arc::new(ReferenceLibrary::new(file.path(), Arc::new(KeywordEmbedder::default())));
        let model = Arc::new(ScriptedModel::new("").failing_on("Helpful Answer", "upstream timeout"));
        let qa = LegalQuestionAnswerer::new(model, library);

        let err = qa.answer("s1", "How many hours a day?").await.unwrap_err();
        assert_eq!(err, HandlerError::Completion("upstream timeout".to_string()));
    }
}
