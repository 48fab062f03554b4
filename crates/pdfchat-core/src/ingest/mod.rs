//! Ingestion stage
//!
//! Parses an uploaded PDF, splits it into overlapping chunks, embeds
//! each chunk and upserts it into the vector store under a freshly
//! generated namespace. Any failure fails the whole upload and no
//! session is registered.

pub mod chunker;
pub mod pdf;

use crate::error::{PdfChatError, Result};
use crate::llm::Embedder;
use crate::session::{Session, SessionStore};
use crate::vectorstore::{VectorRecord, VectorStore};
use chunker::{Chunk, CHUNK_OVERLAP_CHARS, CHUNK_SIZE_CHARS};
use futures::stream::{self, TryStreamExt};
use std::sync::Arc;

/// Cap on in-flight embed+upsert calls during one ingestion
pub const MAX_EMBED_CONCURRENCY: usize = 5;

/// Outcome of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub session_id: String,
    pub namespace: String,
    pub page_count: usize,
    pub chunk_count: usize,
}

/// Turns an uploaded PDF into an indexed, queryable session
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    sessions: Arc<dyn SessionStore>,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            embedder,
            store,
            sessions,
        }
    }

    /// Ingest a PDF from its raw bytes
    pub async fn ingest(&self, bytes: &[u8]) -> Result<IngestOutcome> {
        let pages = pdf::extract_pages(bytes)?;
        self.ingest_pages(pages).await
    }

    /// Ingest already-extracted page texts
    pub async fn ingest_pages(&self, pages: Vec<String>) -> Result<IngestOutcome> {
        let chunks = chunker::chunk_pages(&pages, CHUNK_SIZE_CHARS, CHUNK_OVERLAP_CHARS);
        if chunks.is_empty() {
            return Err(PdfChatError::Parse(
                "Document produced no indexable chunks".to_string(),
            ));
        }

        let session = Session::new();
        let namespace = session.namespace.clone();
        let session_id = session.id.clone();
        let page_count = pages.len();
        let chunk_count = chunks.len();

        tracing::info!(
            namespace = %namespace,
            pages = page_count,
            chunks = chunk_count,
            "Indexing document"
        );

        stream::iter(chunks.into_iter().enumerate().map(Ok::<_, PdfChatError>))
            .try_for_each_concurrent(MAX_EMBED_CONCURRENCY, |(index, chunk)| {
                let namespace = namespace.clone();
                async move { self.index_chunk(&namespace, index, chunk).await }
            })
            .await?;

        self.sessions.put(session).await;

        Ok(IngestOutcome {
            session_id,
            namespace,
            page_count,
            chunk_count,
        })
    }

    /// Embed one chunk and upsert it as a single (vector, text) pair
    async fn index_chunk(&self, namespace: &str, index: usize, chunk: Chunk) -> Result<()> {
        let vector = self.embedder.embed(&chunk.text).await?;

        let record = VectorRecord {
            id: format!("{}-{}", namespace, index),
            values: vector,
            text: chunk.text,
            page: chunk.page,
        };

        self.store.upsert(namespace, vec![record]).await
    }
}
