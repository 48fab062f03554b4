//! Question-answering pipeline
//!
//! One question flows through five stages in order: query rewriting,
//! vector retrieval, relevance filtering, answer generation, history
//! update. Collaborator failures past the rewriting stage are typed
//! internally and mapped to the canonical refusal at a single visible
//! point, so a valid session never observes a failed request.

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::llm::{AnswerGenerator, ChatModel, Embedder, QueryRewriter, NO_ANSWER};
use crate::session::SessionHandle;
use crate::vectorstore::{RetrievalResult, VectorStore};
use std::sync::Arc;

/// Separator between chunk texts in the assembled context
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Retrieval-augmented question answering over one session's namespace
pub struct QaPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    rewriter: QueryRewriter,
    generator: AnswerGenerator,
    retrieval: RetrievalConfig,
}

impl QaPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
        store: Arc<dyn VectorStore>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            rewriter: QueryRewriter::new(chat.clone()),
            generator: AnswerGenerator::new(chat),
            retrieval,
        }
    }

    /// Answer a question against a session.
    ///
    /// Holds the session's mutex for the duration of the request, which
    /// serializes concurrent questions within one session. Always
    /// produces an answer string; degraded stages answer with
    /// [`NO_ANSWER`].
    pub async fn answer(&self, question: &str, session: &SessionHandle) -> String {
        let mut session = session.lock().await;

        let query = self.rewriter.rewrite(question, &session.history).await;
        let namespace = session.namespace.clone();

        let answer = match self.answer_from_index(&query, &namespace).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(
                    session = %session.id,
                    "Answer path degraded to refusal: {}",
                    e
                );
                NO_ANSWER.to_string()
            }
        };

        session.record_exchange(question, answer.clone());

        answer
    }

    /// Retrieval, filtering and generation; errors here are
    /// collaborator failures that the caller maps to the refusal
    async fn answer_from_index(&self, query: &str, namespace: &str) -> Result<String> {
        let results = self.retrieve(query, namespace).await?;
        let context = build_context(&results, self.retrieval.min_score);

        if context.is_none() {
            tracing::debug!(query, "No chunk passed the relevance gate");
        }

        self.generator.generate(query, context.as_deref()).await
    }

    /// Embed the query and fetch the top-k nearest chunks.
    ///
    /// The embedder is the same one used at ingestion; querying a
    /// namespace with a different embedding space silently degrades
    /// relevance with no error signal.
    async fn retrieve(&self, query: &str, namespace: &str) -> Result<Vec<RetrievalResult>> {
        let vector = self.embedder.embed(query).await?;
        self.store
            .query(namespace, vector, self.retrieval.top_k)
            .await
    }
}

/// Drop results below the threshold and join the survivors, in
/// retrieved (score-descending) order, with [`CONTEXT_SEPARATOR`].
/// Returns `None` when nothing survives; that is a normal outcome.
pub fn build_context(results: &[RetrievalResult], min_score: f32) -> Option<String> {
    let surviving: Vec<&str> = results
        .iter()
        .filter(|r| r.score >= min_score)
        .map(|r| r.text.as_str())
        .filter(|t| !t.trim().is_empty())
        .collect();

    if surviving.is_empty() {
        None
    } else {
        Some(surviving.join(CONTEXT_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PdfChatError;
    use crate::llm::{ChatMessage, ChatOptions};
    use crate::session::{InMemorySessionStore, Role, Session, SessionStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingEmbedder {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Embedder for RecordingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.queries.lock().unwrap().push(text.to_string());
            Ok(vec![0.5; 4])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
        }

        fn dimensions(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    struct StubChat {
        response: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatModel for StubChat {
        async fn chat_completion(
            &self,
            _messages: Vec<ChatMessage>,
            _options: ChatOptions,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Some(r) => Ok(r.clone()),
                None => Err(PdfChatError::Llm("unavailable".to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    struct FixedStore {
        results: Vec<RetrievalResult>,
    }

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn upsert(
            &self,
            _namespace: &str,
            _records: Vec<crate::vectorstore::VectorRecord>,
        ) -> Result<()> {
            Ok(())
        }

        async fn query(
            &self,
            _namespace: &str,
            _vector: Vec<f32>,
            _top_k: usize,
        ) -> Result<Vec<RetrievalResult>> {
            Ok(self.results.clone())
        }
    }

    fn result(text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            text: text.to_string(),
            score,
        }
    }

    fn pipeline(
        chat: Arc<StubChat>,
        results: Vec<RetrievalResult>,
    ) -> (QaPipeline, Arc<RecordingEmbedder>) {
        let embedder = Arc::new(RecordingEmbedder {
            queries: Mutex::new(Vec::new()),
        });
        let pipeline = QaPipeline::new(
            embedder.clone(),
            chat,
            Arc::new(FixedStore { results }),
            RetrievalConfig::default(),
        );
        (pipeline, embedder)
    }

    async fn fresh_session() -> SessionHandle {
        InMemorySessionStore::new().put(Session::new()).await
    }

    #[test]
    fn test_build_context_joins_survivors_in_order() {
        let results = vec![
            result("best", 0.9),
            result("good", 0.7),
            result("weak", 0.49),
            result("  ", 0.8),
        ];

        let context = build_context(&results, 0.5).unwrap();

        assert_eq!(context, format!("best{}good", CONTEXT_SEPARATOR));
    }

    #[test]
    fn test_build_context_none_when_all_below_threshold() {
        let results: Vec<_> = (0..10).map(|i| result("text", 0.1 + i as f32 * 0.03)).collect();
        assert!(build_context(&results, 0.5).is_none());
    }

    #[test]
    fn test_build_context_threshold_is_inclusive() {
        let results = vec![result("edge", 0.5)];
        assert_eq!(build_context(&results, 0.5).unwrap(), "edge");
    }

    #[tokio::test]
    async fn test_relevance_gate_refuses_without_generation() {
        // 2 of 10 would pass at 0.5; here none do, so the chat
        // collaborator must never be invoked (fresh session means the
        // rewriter is also skipped).
        let chat = Arc::new(StubChat {
            response: Some("should not be called".to_string()),
            calls: AtomicUsize::new(0),
        });
        let results: Vec<_> = (0..10).map(|_| result("irrelevant", 0.2)).collect();
        let (pipeline, _) = pipeline(chat.clone(), results);
        let session = fresh_session().await;

        let answer = pipeline.answer("What is X?", &session).await;

        assert_eq!(answer, NO_ANSWER);
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fresh_session_queries_with_verbatim_question() {
        let chat = Arc::new(StubChat {
            response: Some("An answer.".to_string()),
            calls: AtomicUsize::new(0),
        });
        let (pipeline, embedder) = pipeline(chat, vec![result("relevant", 0.9)]);
        let session = fresh_session().await;

        pipeline.answer("What is X?", &session).await;
        pipeline.answer("What is X?", &session).await;

        let queries = embedder.queries.lock().unwrap();
        assert_eq!(queries[0], "What is X?");
    }

    #[tokio::test]
    async fn test_history_alternates_user_model() {
        let chat = Arc::new(StubChat {
            response: Some("An answer.".to_string()),
            calls: AtomicUsize::new(0),
        });
        let (pipeline, _) = pipeline(chat, vec![result("relevant", 0.9)]);
        let session = fresh_session().await;

        for i in 0..3 {
            pipeline.answer(&format!("question {}", i), &session).await;
        }

        let guard = session.lock().await;
        assert_eq!(guard.history.len(), 6);
        for (i, turn) in guard.history.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Model };
            assert_eq!(turn.role, expected);
        }
        assert_eq!(guard.history[0].text, "question 0");
        assert_eq!(guard.history[4].text, "question 2");
    }

    #[tokio::test]
    async fn test_refusal_is_recorded_in_history() {
        let chat = Arc::new(StubChat {
            response: None,
            calls: AtomicUsize::new(0),
        });
        let (pipeline, _) = pipeline(chat, vec![result("relevant", 0.9)]);
        let session = fresh_session().await;

        let answer = pipeline.answer("What is X?", &session).await;

        assert_eq!(answer, NO_ANSWER);
        let guard = session.lock().await;
        assert_eq!(guard.history.len(), 2);
        assert_eq!(guard.history[1].text, NO_ANSWER);
    }

    #[tokio::test]
    async fn test_rewriter_failure_degrades_to_original_question() {
        // Chat collaborator is down: rewriting falls back to the
        // original question and the request still produces an answer.
        let chat = Arc::new(StubChat {
            response: None,
            calls: AtomicUsize::new(0),
        });
        let (pipeline, embedder) = pipeline(chat, vec![result("relevant", 0.9)]);
        let session = fresh_session().await;
        {
            let mut guard = session.lock().await;
            guard.record_exchange("earlier question", "earlier answer");
        }

        let answer = pipeline.answer("And what about Y?", &session).await;

        assert_eq!(answer, NO_ANSWER);
        let queries = embedder.queries.lock().unwrap();
        assert_eq!(queries.as_slice(), ["And what about Y?"]);
    }

    #[tokio::test]
    async fn test_original_question_recorded_not_rewritten() {
        let chat = Arc::new(StubChat {
            response: Some("Standalone question?".to_string()),
            calls: AtomicUsize::new(0),
        });
        let (pipeline, embedder) = pipeline(chat, vec![result("relevant", 0.9)]);
        let session = fresh_session().await;
        {
            let mut guard = session.lock().await;
            guard.record_exchange("earlier question", "earlier answer");
        }

        pipeline.answer("What about it?", &session).await;

        // Retrieval saw the rewritten query, history the original.
        let queries = embedder.queries.lock().unwrap();
        assert_eq!(queries.as_slice(), ["Standalone question?"]);
        let guard = session.lock().await;
        assert_eq!(guard.history[2].text, "What about it?");
    }
}
