//! HTTP surface
//!
//! Two endpoints form the system boundary: `POST /upload` (multipart
//! `pdf` field) creates a session from a PDF, `POST /ask` answers a
//! question against an existing session. Upload failures surface as
//! errors; collaborator failures during question answering never do,
//! they degrade to the canonical refusal inside the pipeline.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use pdfchat_core::{Ingestor, PdfChatError, QaPipeline, SessionStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upload size cap (50 MB)
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
    pub pipeline: Arc<QaPipeline>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/upload", post(upload_handler))
        .route("/ask", post(ask_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
    }))
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    #[serde(rename = "sessionId")]
    session_id: String,
}

async fn upload_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut pdf_bytes = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("pdf") {
            match field.bytes().await {
                Ok(bytes) => pdf_bytes = Some(bytes),
                Err(e) => return ingestion_error(PdfChatError::InvalidInput(e.to_string())),
            }
            break;
        }
    }

    let bytes = match pdf_bytes {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No file uploaded" })),
            )
                .into_response();
        }
    };

    match state.ingestor.ingest(&bytes).await {
        Ok(outcome) => {
            tracing::info!(
                session = %outcome.session_id,
                pages = outcome.page_count,
                chunks = outcome.chunk_count,
                "Document ingested"
            );
            (
                StatusCode::OK,
                Json(UploadResponse {
                    message: format!(
                        "Indexed {} chunks from {} pages",
                        outcome.chunk_count, outcome.page_count
                    ),
                    session_id: outcome.session_id,
                }),
            )
                .into_response()
        }
        Err(e) => ingestion_error(e),
    }
}

fn ingestion_error(e: PdfChatError) -> Response {
    tracing::error!("Upload failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": format!("Failed to process PDF: {}", e) })),
    )
        .into_response()
}

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: Option<String>,
    #[serde(default, rename = "sessionId")]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

async fn ask_handler(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Response {
    let (question, session_id) = match (
        request.question.as_deref().map(str::trim),
        request.session_id.as_deref().map(str::trim),
    ) {
        (Some(q), Some(s)) if !q.is_empty() && !s.is_empty() => (q, s),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing question or session ID" })),
            )
                .into_response();
        }
    };

    let session = match state.sessions.get(session_id).await {
        Some(session) => session,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid session ID" })),
            )
                .into_response();
        }
    };

    let answer = state.pipeline.answer(question, &session).await;

    (StatusCode::OK, Json(AskResponse { answer })).into_response()
}
