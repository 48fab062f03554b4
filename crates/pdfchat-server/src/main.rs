//! Pdfchat server
//!
//! Upload a PDF, ask questions about it.

use anyhow::Result;
use clap::Parser;
use pdfchat_core::{
    Config, HttpVectorStore, InMemorySessionStore, Ingestor, OpenAiClient, QaPipeline,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

mod server;

use server::{create_app, AppState};

#[derive(Parser)]
#[command(name = "pdfchat", about = "Chat with an uploaded PDF over HTTP")]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, env = "PDFCHAT_BIND", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Path to the YAML config file (defaults to the platform config dir)
    #[arg(long, env = "PDFCHAT_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let llm = Arc::new(OpenAiClient::new(config.llm_service.clone())?);
    let vector_store = Arc::new(HttpVectorStore::new(config.vector_store.clone())?);
    let sessions = Arc::new(InMemorySessionStore::new());

    let ingestor = Arc::new(Ingestor::new(
        llm.clone(),
        vector_store.clone(),
        sessions.clone(),
    ));
    let pipeline = Arc::new(QaPipeline::new(
        llm.clone(),
        llm,
        vector_store,
        config.retrieval.clone(),
    ));

    let state = AppState {
        ingestor,
        pipeline,
        sessions,
    };

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(cli.bind).await?;
    tracing::info!("pdfchat listening on {}", cli.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
