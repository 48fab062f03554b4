//! Conversational query rewriting
//!
//! Turns a follow-up question into a standalone one by replaying the
//! session's recent turns to the chat collaborator. Rewriting is an
//! optimization, not a correctness requirement: any failure falls back
//! to the original question.

use crate::llm::{ChatMessage, ChatModel, ChatOptions};
use crate::session::{Role, Turn};
use std::sync::Arc;

/// Most recent turns replayed to the rewriter; older turns are dropped
/// from the replay (the stored history itself is untouched).
pub const REPLAY_WINDOW_TURNS: usize = 20;

const REWRITE_INSTRUCTION: &str =
    "Rewrite the user's latest question as a standalone question that can be \
     understood without the conversation above. Preserve the original intent. \
     Respond with only the rewritten question, nothing else.";

/// Rewrites follow-up questions into standalone ones
pub struct QueryRewriter {
    chat: Arc<dyn ChatModel>,
}

impl QueryRewriter {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Rewrite `question` in the context of `history`.
    ///
    /// An empty history returns the question unchanged without calling
    /// the collaborator. Collaborator failures and blank responses also
    /// return the original question.
    pub async fn rewrite(&self, question: &str, history: &[Turn]) -> String {
        if history.is_empty() {
            return question.to_string();
        }

        let window_start = history.len().saturating_sub(REPLAY_WINDOW_TURNS);

        let mut messages = vec![ChatMessage::system(REWRITE_INSTRUCTION)];
        for turn in &history[window_start..] {
            messages.push(match turn.role {
                Role::User => ChatMessage::user(&turn.text),
                Role::Model => ChatMessage::assistant(&turn.text),
            });
        }
        messages.push(ChatMessage::user(question));

        let options = ChatOptions {
            temperature: 0.1,
            max_tokens: 256,
        };

        match self.chat.chat_completion(messages, options).await {
            Ok(response) => {
                let rewritten = response.trim();
                if rewritten.is_empty() {
                    tracing::warn!("Rewriter returned empty response, using original question");
                    question.to_string()
                } else {
                    tracing::debug!(original = question, rewritten, "Rewrote question");
                    rewritten.to_string()
                }
            }
            Err(e) => {
                tracing::warn!("Query rewriting failed, using original question: {}", e);
                question.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PdfChatError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubChat {
        response: Option<String>,
        calls: AtomicUsize,
    }

    impl StubChat {
        fn returning(response: &str) -> Self {
            Self {
                response: Some(response.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                calls: AtomicUsize::new(0),
            }
        }
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

    fn history() -> Vec<Turn> {
        vec![
            Turn::user("What is the warranty period?"),
            Turn::model("The warranty period is two years."),
        ]
    }

    #[tokio::test]
    async fn test_empty_history_skips_collaborator() {
        let chat = Arc::new(StubChat::returning("should not be used"));
        let rewriter = QueryRewriter::new(chat.clone());

        let result = rewriter.rewrite("What about returns?", &[]).await;

        assert_eq!(result, "What about returns?");
        assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rewrites_with_history() {
        let chat = Arc::new(StubChat::returning(
            "  What does the warranty cover for returns?  ",
        ));
        let rewriter = QueryRewriter::new(chat.clone());

        let result = rewriter.rewrite("What about returns?", &history()).await;

        assert_eq!(result, "What does the warranty cover for returns?");
        assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_falls_back_on_failure() {
        let chat = Arc::new(StubChat::failing());
        let rewriter = QueryRewriter::new(chat);

        let result = rewriter.rewrite("What about returns?", &history()).await;

        assert_eq!(result, "What about returns?");
    }

    #[tokio::test]
    async fn test_falls_back_on_blank_response() {
        let chat = Arc::new(StubChat::returning("   "));
        let rewriter = QueryRewriter::new(chat);

        let result = rewriter.rewrite("What about returns?", &history()).await;

        assert_eq!(result, "What about returns?");
    }
}
