//! # Timeline Chat over OpenAI
//!
//! Interactive chat about a work-history entry read from a JSON file, using
//! OpenAI for both embeddings and completions.
//!
//! Run: `OPENAI_API_KEY=sk-... cargo run --example timeline_openai --features openai -- record.json`
//!
//! Type a question per line; an empty line ends the conversation.

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::Context;
use timeline_rag::openai::OpenAIProvider;
use timeline_rag::{ChatSession, RagError, WorkRecord};
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timeline_rag=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = std::env::args().nth(1).context("usage: timeline_openai <record.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let record: WorkRecord = serde_json::from_str(&raw).context("parsing work record")?;

    let provider = Arc::new(OpenAIProvider::from_env()?);
    let mut session = ChatSession::builder()
        .embedding_provider(provider.clone())
        .completion_provider(provider)
        .record(record)
        .build()?;
    session.prepare().await?;

    println!(
        "Ask about your time at {} ({} fragments indexed).",
        session.record().company,
        session.fragments().map_or(0, <[_]>::len)
    );

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim().is_empty() {
            break;
        }

        match session.ask(line.trim()).await {
            Ok(reply) => println!("{}\n", reply.answer),
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "provider failed, ask again to retry");
            }
            Err(RagError::Cancelled) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
