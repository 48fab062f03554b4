//! Context-constrained answer generation

use crate::error::Result;
use crate::llm::{ChatMessage, ChatModel, ChatOptions};
use std::sync::Arc;

/// Canonical answer when nothing relevant was found or the generation
/// collaborator is unavailable
pub const NO_ANSWER: &str = "I couldn't find the answer in the document.";

/// Phrases that mark a generated answer as a refusal; matched
/// case-insensitively and normalized to [`NO_ANSWER`]
const REFUSAL_MARKERS: [&str; 5] = [
    "couldn't find",
    "could not find",
    "cannot answer",
    "can't answer",
    "don't have enough information",
];

/// Generates answers constrained to retrieved document context
pub struct AnswerGenerator {
    chat: Arc<dyn ChatModel>,
}

impl AnswerGenerator {
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Generate an answer from the given context.
    ///
    /// `None` context short-circuits to [`NO_ANSWER`] without calling
    /// the collaborator. Collaborator failures propagate as typed
    /// errors; the pipeline boundary maps them to [`NO_ANSWER`].
    pub async fn generate(&self, question: &str, context: Option<&str>) -> Result<String> {
        let context = match context {
            Some(c) => c,
            None => return Ok(NO_ANSWER.to_string()),
        };

        let prompt = build_answer_prompt(question, context);

        let options = ChatOptions {
            temperature: 0.3,
            max_tokens: 500,
        };

        let response = self
            .chat
            .chat_completion(vec![ChatMessage::user(prompt)], options)
            .await?;

        Ok(normalize_refusal(response.trim()))
    }
}

fn build_answer_prompt(question: &str, context: &str) -> String {
    format!(
        r#"Answer the question using only the context below, taken from a document the user uploaded.
If the context does not contain the answer, say that you couldn't find the answer in the document.
Do not use outside knowledge.

Context:
{}

Question: {}

Answer:"#,
        context, question
    )
}

/// Normalize answers that express inability to answer to the canonical
/// refusal string. Substring heuristic; false positives are acceptable.
fn normalize_refusal(answer: &str) -> String {
    let lowered = answer.to_lowercase();
    if answer.trim().is_empty() || REFUSAL_MARKERS.iter().any(|m| lowered.contains(m)) {
        NO_ANSWER.to_string()
    } else {
        answer.to_string()
    }
}
