//! # Timeline Chat Example
//!
//! Builds a chat session over one work-history entry and asks a few
//! questions, including a follow-up that relies on conversation memory.
//!
//! Uses a bag-of-words `MockEmbeddingProvider` and a rule-based
//! `MockCompletionProvider` so it runs with **zero API keys**.
//!
//! Run: `RUST_LOG=timeline_rag=debug cargo run --example timeline_chat`

use std::sync::Arc;

use timeline_rag::{
    Accomplishment, ChatConfig, ChatSession, CompletionProvider, EmbeddingProvider, ModelTier,
    WorkRecord,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// ---------------------------------------------------------------------------
// MockEmbeddingProvider: hashes each word into a bucket
// ---------------------------------------------------------------------------

struct MockEmbeddingProvider {
    dimensions: usize,
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> timeline_rag::Result<Vec<f32>> {
        let mut emb = vec![0.0f32; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| w.len() > 3) {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            emb[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        Ok(emb)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock-embedding"
    }
}

// ---------------------------------------------------------------------------
// MockCompletionProvider: answers each prompt kind with a fixed rule
// ---------------------------------------------------------------------------

struct MockCompletionProvider;

fn section<'a>(prompt: &'a str, marker: &str) -> &'a str {
    prompt
        .split_once(marker)
        .map(|(_, rest)| rest.split("\n----------").next().unwrap_or_default().trim())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, prompt: &str, _tier: ModelTier) -> timeline_rag::Result<String> {
        let reply = if prompt.ends_with("Refined answer:") {
            section(prompt, "RESPONSE:").to_string()
        } else if prompt.ends_with("Helpful Answer:") {
            let context = section(prompt, "CONTEXT:");
            match context.lines().next() {
                Some(first) if !first.is_empty() => format!("From my experience: {first}"),
                _ => timeline_rag::prompts::CLARIFICATION_REPLY.to_string(),
            }
        } else if prompt.ends_with("Standalone question:") {
            section(prompt, "FOLLOWUP QUESTION:").to_string()
        } else if prompt.ends_with("Structured request:") {
            r#"{"query": "", "filter": null}"#.to_string()
        } else {
            let question = prompt.trim_end().rsplit("Human: ").next().unwrap_or_default();
            let specific = ["migration", "project", "feature"]
                .iter()
                .any(|word| question.to_lowercase().contains(word));
            let label = if specific { "specific" } else { "general" };
            label.to_string()
        };
        Ok(reply)
    }

    fn name(&self) -> &str {
        "mock-completion"
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("timeline_rag=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let record = WorkRecord {
        company: "Acme Payments".into(),
        job_title: "Senior Backend Engineer".into(),
        start_date: "2019".into(),
        end_date: "2023".into(),
        responsibilities: vec!["Owned the billing and invoicing services".into()],
        accomplishments: vec![
            Accomplishment::new(
                "Led billing migration",
                "Migrated the billing system to a new database with zero downtime",
                Accomplishment::parse_skills("SQL, planning; Postgres"),
            ),
            Accomplishment::new(
                "Mentored new hires",
                "Coached three junior engineers through onboarding and their first releases",
                ["mentoring"],
            ),
        ],
    };

    // A low threshold suits the coarse mock embeddings.
    let config = ChatConfig::builder().similarity_threshold(0.3).persona("Sam").build()?;

    let mut session = ChatSession::builder()
        .config(config)
        .embedding_provider(Arc::new(MockEmbeddingProvider { dimensions: 64 }))
        .completion_provider(Arc::new(MockCompletionProvider))
        .record(record)
        .build()?;

    for question in [
        "Tell me about the billing migration project",
        "What was your role at this company?",
        "What database did that migration move to?",
    ] {
        let reply = session.ask(question).await?;
        println!("Q: {question}");
        println!("A: {}", reply.answer);
        println!("   ({:?} path, {} sources)", reply.path, reply.source_fragments.len());
        for fragment in &reply.source_fragments {
            println!("   - {}", fragment.metadata.headline);
        }
        println!();
    }

    println!("Conversation so far ({} turns):", session.memory().len());
    println!("{}", serde_json::to_string_pretty(session.memory())?);

    Ok(())
}
