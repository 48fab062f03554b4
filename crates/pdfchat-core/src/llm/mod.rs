//! LLM integration
//!
//! Provides traits and implementations for:
//! - Chat completion and embedding generation via external services
//!   (vLLM, OpenAI, etc.)
//! - Conversational query rewriting
//! - Context-constrained answer generation

mod client;
mod generator;
mod rewriter;
mod traits;

pub use client::OpenAiClient;
pub use generator::{AnswerGenerator, NO_ANSWER};
pub use rewriter::{QueryRewriter, REPLAY_WINDOW_TURNS};
pub use traits::{ChatMessage, ChatModel, ChatOptions, Embedder};
