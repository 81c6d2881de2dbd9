//! Deterministic providers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use timeline_rag::{
    Accomplishment, CompletionProvider, EmbeddingProvider, ModelTier, RagError, Result, WorkRecord,
};

/// Words the keyword embedder turns into dimensions.
pub const VOCAB: [&str; 6] = ["billing", "migrat", "database", "mentor", "coach", "engineer"];

/// Embeds text as keyword presence over [`VOCAB`].
///
/// Text without any keyword embeds to the zero vector, which scores 0.0
/// against everything.
#[derive(Debug, Default)]
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        VOCAB.iter().map(|word| if text.contains(word) { 1.0 } else { 0.0 }).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

/// Keyword embeddings, but blank input is refused the way hosted endpoints refuse it.
#[derive(Debug, Default)]
pub struct StrictKeywordEmbedder {
    pub inner: KeywordEmbedder,
}

#[async_trait]
impl EmbeddingProvider for StrictKeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RagError::EmbeddingError {
                provider: "strict".into(),
                message: "input must not be empty".into(),
            });
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }
}

/// An embedder that always fails.
#[derive(Debug, Default)]
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError { provider: "failing".into(), message: "offline".into() })
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }
}

/// Which prompt a completion call carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Classify,
    SelfQuery,
    Rewrite,
    Answer,
    Refine,
}

impl PromptKind {
    pub fn of(prompt: &str) -> Self {
        if prompt.ends_with("Refined answer:") {
            PromptKind::Refine
        } else if prompt.ends_with("Helpful Answer:") {
            PromptKind::Answer
        } else if prompt.ends_with("Standalone question:") {
            PromptKind::Rewrite
        } else if prompt.ends_with("Structured request:") {
            PromptKind::SelfQuery
        } else if prompt.starts_with("Classify the user's query") {
            PromptKind::Classify
        } else {
            panic!("unrecognised prompt: {prompt}")
        }
    }
}

/// Text between `start` and the next field separator.
fn field<'a>(prompt: &'a str, start: &str) -> &'a str {
    prompt
        .split_once(start)
        .map(|(_, rest)| rest.split("\n----------").next().unwrap_or_default())
        .unwrap_or_default()
}

/// The serialized context carried by an answer prompt.
pub fn context_of(prompt: &str) -> &str {
    field(prompt, "CONTEXT: ")
}

/// A completion provider that answers each prompt kind by rule and records
/// every call.
///
/// - classification returns [`label`](Self::set_label) (default `specific`)
/// - self-query returns [`self_query`](Self::set_self_query) (default no filter)
/// - rewrite returns `STANDALONE: <follow-up>`
/// - answer returns `ANSWER[<context>]`
/// - refine returns `REFINED: <response>` unless overridden
#[derive(Debug)]
pub struct ScriptedCompletion {
    label: Mutex<String>,
    self_query: Mutex<String>,
    refine_override: Mutex<Option<String>>,
    fail_answers: AtomicBool,
    calls: Mutex<Vec<(PromptKind, ModelTier, String)>>,
}

impl Default for ScriptedCompletion {
    fn default() -> Self {
        Self {
            label: Mutex::new("specific".into()),
            self_query: Mutex::new(r#"{"query": "", "filter": null}"#.into()),
            refine_override: Mutex::new(None),
            fail_answers: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedCompletion {
    pub fn set_label(&self, label: &str) {
        *self.label.lock().unwrap() = label.to_string();
    }

    pub fn set_self_query(&self, raw: &str) {
        *self.self_query.lock().unwrap() = raw.to_string();
    }

    pub fn set_refinement(&self, refined: &str) {
        *self.refine_override.lock().unwrap() = Some(refined.to_string());
    }

    /// Make answer generation fail until switched back.
    pub fn fail_answers(&self, fail: bool) {
        self.fail_answers.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(PromptKind, ModelTier, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: PromptKind) -> usize {
        self.calls.lock().unwrap().iter().filter(|(k, _, _)| *k == kind).count()
    }

    /// Prompts of the given kind, in call order.
    pub fn prompts(&self, kind: PromptKind) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, _, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, prompt: &str, tier: ModelTier) -> Result<String> {
        let kind = PromptKind::of(prompt);
        self.calls.lock().unwrap().push((kind, tier, prompt.to_string()));

        let reply = match kind {
            PromptKind::Classify => self.label.lock().unwrap().clone(),
            PromptKind::SelfQuery => self.self_query.lock().unwrap().clone(),
            PromptKind::Rewrite => format!("STANDALONE: {}", field(prompt, "FOLLOWUP QUESTION: ")),
            PromptKind::Answer => {
                if self.fail_answers.load(Ordering::SeqCst) {
                    return Err(RagError::CompletionError {
                        provider: "scripted".into(),
                        tier,
                        message: "model overloaded".into(),
                    });
                }
                format!("ANSWER[{}]", context_of(prompt))
            }
            PromptKind::Refine => match self.refine_override.lock().unwrap().clone() {
                Some(refined) => refined,
                None => format!("REFINED: {}", field(prompt, "RESPONSE: ")),
            },
        };
        Ok(reply)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A completion provider whose calls never finish.
#[derive(Debug, Default)]
pub struct PendingCompletion {
    pub started: AtomicUsize,
}

#[async_trait]
impl CompletionProvider for PendingCompletion {
    async fn complete(&self, _prompt: &str, _tier: ModelTier) -> Result<String> {
        self.started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// The billing-migration record used across tests.
pub fn billing_record() -> WorkRecord {
    WorkRecord {
        company: "Acme".into(),
        job_title: "Senior Engineer".into(),
        start_date: "2019".into(),
        end_date: "2023".into(),
        responsibilities: vec!["Owned the payments platform".into()],
        accomplishments: vec![
            Accomplishment::new(
                "Led migration",
                "Migrated billing system to a new database with zero downtime",
                ["SQL", "planning"],
            ),
            Accomplishment::new(
                "Grew the team",
                "Coached three juniors through onboarding",
                ["mentoring"],
            ),
        ],
    }
}
