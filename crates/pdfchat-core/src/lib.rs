//! Pdfchat Core Library
//!
//! Retrieval-augmented question answering over uploaded PDFs.
//!
//! # Pipeline
//! - PDF extraction and overlapping chunking at ingestion
//! - Embedding + upsert into a namespace-partitioned vector store
//! - Conversational query rewriting with graceful fallback
//! - Namespace-scoped top-k retrieval with a relevance gate
//! - Context-constrained answer generation with refusal normalization

pub mod config;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod session;
pub mod vectorstore;

pub use config::{Config, LlmServiceConfig, RetrievalConfig, VectorStoreConfig};
pub use error::{Error, PdfChatError, Result};
pub use ingest::{IngestOutcome, Ingestor, MAX_EMBED_CONCURRENCY};
pub use llm::{
    AnswerGenerator, ChatMessage, ChatModel, ChatOptions, Embedder, OpenAiClient, QueryRewriter,
    NO_ANSWER, REPLAY_WINDOW_TURNS,
};
pub use pipeline::{build_context, QaPipeline, CONTEXT_SEPARATOR};
pub use session::{
    InMemorySessionStore, Role, Session, SessionHandle, SessionStore, Turn,
};
pub use vectorstore::{HttpVectorStore, RetrievalResult, VectorRecord, VectorStore};

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "pdfchat";
