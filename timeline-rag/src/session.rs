//! Chat session orchestrator.
//!
//! A [`ChatSession`] answers questions about one [`WorkRecord`]. Each turn:
//!
//! 1. classifies the question while both retrieval strategies run concurrently,
//! 2. picks the attribute-scoped hits if any, else the hierarchical hits,
//! 3. answers from those hits when the question is specific and hits exist,
//!    otherwise from every fragment of the record,
//! 4. refines the answer and commits the turn to memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use timeline_rag::{ChatConfig, ChatSession};
//!
//! let mut session = ChatSession::builder()
//!     .config(ChatConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .completion_provider(Arc::new(llm))
//!     .record(record)
//!     .build()?;
//!
//! let reply = session.ask("What migration work have you done?").await?;
//! println!("{}", reply.answer);
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::attribute::AttributeRetriever;
use crate::chain::ConversationalQaChain;
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::classifier::{QueryClass, QueryClassifier};
use crate::completion::CompletionProvider;
use crate::config::ChatConfig;
use crate::document::Fragment;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::fragment::FragmentBuilder;
use crate::index::SimilarityIndex;
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::record::WorkRecord;
use crate::refiner::AnswerRefiner;
use crate::retriever::{HierarchicalRetriever, Retriever};

/// Which context a turn was answered from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPath {
    /// Retrieved fragments for a specific question.
    Specific,
    /// Every fragment of the record.
    General,
}

/// The context chosen for a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalOutcome {
    Specific(Vec<Fragment>),
    General(Vec<Fragment>),
}

impl RetrievalOutcome {
    /// Choose between retrieved candidates and the full fragment list.
    ///
    /// Only a specific question with at least one candidate takes the specific
    /// path; everything else gets the whole record.
    pub fn select(class: QueryClass, candidates: Vec<Fragment>, all: &[Fragment]) -> Self {
        match class {
            QueryClass::Specific if !candidates.is_empty() => RetrievalOutcome::Specific(candidates),
            QueryClass::Specific => {
                warn!("no fragments retrieved for a specific question, using the full record");
                RetrievalOutcome::General(all.to_vec())
            }
            QueryClass::General => RetrievalOutcome::General(all.to_vec()),
        }
    }

    pub fn path(&self) -> RetrievalPath {
        match self {
            RetrievalOutcome::Specific(_) => RetrievalPath::Specific,
            RetrievalOutcome::General(_) => RetrievalPath::General,
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        match self {
            RetrievalOutcome::Specific(fragments) | RetrievalOutcome::General(fragments) => fragments,
        }
    }
}

/// The reply to one question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// The refined, user-facing answer. Never empty.
    pub answer: String,
    /// The fragments the answer was grounded in.
    pub source_fragments: Vec<Fragment>,
    /// Which context was used.
    pub path: RetrievalPath,
    /// How the question was classified.
    pub classification: QueryClass,
    /// The standalone form of the question the answer model saw.
    pub standalone_question: String,
}

/// Everything derived from one record. Read-only once built.
struct RecordIndex {
    fingerprint: String,
    fragments: Vec<Fragment>,
    attribute: Box<dyn Retriever>,
    hierarchical: Box<dyn Retriever>,
}

impl RecordIndex {
    async fn build(
        record: &WorkRecord,
        config: &ChatConfig,
        embedder: &Arc<dyn EmbeddingProvider>,
        completion: &Arc<dyn CompletionProvider>,
        chunker: &dyn Chunker,
    ) -> Result<Self> {
        let fragments = FragmentBuilder::new()
            .content(config.fragment_content)
            .include_responsibilities(config.include_responsibilities)
            .build(record);

        // Blank fragments still reach the general path but are never embedded.
        let searchable: Vec<Fragment> =
            fragments.iter().filter(|f| !f.content.trim().is_empty()).cloned().collect();

        let (fragment_index, hierarchical) = tokio::try_join!(
            SimilarityIndex::build(Arc::clone(embedder), searchable),
            HierarchicalRetriever::build(
                Arc::clone(embedder),
                chunker,
                fragments.clone(),
                config.child_search_params(),
                config.max_parents,
            ),
        )?;

        info!(
            company = %record.company,
            fragment_count = fragments.len(),
            child_count = hierarchical.child_count(),
            "built record index"
        );

        let attribute = AttributeRetriever::new(
            fragment_index,
            Arc::clone(completion),
            config.attribute_tier,
            config.attribute_top_k,
        );

        Ok(Self {
            fingerprint: record.fingerprint(),
            fragments,
            attribute: Box::new(attribute),
            hierarchical: Box::new(hierarchical),
        })
    }
}

/// A conversation about a single work record.
///
/// Questions are answered one at a time (`ask` takes `&mut self`). Derived
/// indices are built on first use and cached against the record fingerprint.
pub struct ChatSession {
    config: ChatConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    completion: Arc<dyn CompletionProvider>,
    chunker: Arc<dyn Chunker>,
    classifier: QueryClassifier,
    chain: ConversationalQaChain,
    refiner: AnswerRefiner,
    record: WorkRecord,
    index: Option<Arc<RecordIndex>>,
    memory: ConversationMemory,
}

impl ChatSession {
    /// Create a new [`ChatSessionBuilder`].
    pub fn builder() -> ChatSessionBuilder {
        ChatSessionBuilder::default()
    }

    /// Return a reference to the session configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// The record this session answers questions about.
    pub fn record(&self) -> &WorkRecord {
        &self.record
    }

    /// The turns answered so far, oldest first.
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// The record's fragments, once the index has been built.
    pub fn fragments(&self) -> Option<&[Fragment]> {
        self.index.as_deref().map(|index| index.fragments.as_slice())
    }

    /// Build the record index now instead of on the first question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if fragments cannot be embedded.
    pub async fn prepare(&mut self) -> Result<()> {
        self.ensure_index().await.map(|_| ())
    }

    /// Switch to a different record.
    ///
    /// A record with different content starts a fresh conversation: the cached
    /// index and the memory are both dropped. Identical content is a no-op.
    pub fn replace_record(&mut self, record: WorkRecord) {
        if record.fingerprint() == self.record.fingerprint() {
            return;
        }
        info!(company = %record.company, "record changed, starting a new conversation");
        self.record = record;
        self.index = None;
        self.memory = ConversationMemory::new();
    }

    /// Forget the conversation so far, keeping the record index.
    pub fn end_conversation(&mut self) {
        self.memory = ConversationMemory::new();
    }

    /// Answer `question`.
    ///
    /// # Errors
    ///
    /// Provider failures abort the turn: no answer is returned and memory is
    /// left unchanged, so the same question can simply be asked again.
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        self.ask_with_cancel(question, &CancellationToken::new()).await
    }

    /// Answer `question`, giving up as soon as `cancel` fires.
    ///
    /// In-flight provider calls are dropped on cancellation and the turn is
    /// not recorded.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Cancelled`] when cancelled, otherwise as [`ask`](Self::ask).
    pub async fn ask_with_cancel(
        &mut self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<Answer> {
        let index = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RagError::Cancelled),
            index = self.ensure_index() => index?,
        };

        let (answer, turn) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("question cancelled before an answer was produced");
                return Err(RagError::Cancelled);
            }
            result = self.run_turn(&index, question) => result.map_err(|e| {
                error!(error = %e, "turn aborted");
                e
            })?,
        };

        if cancel.is_cancelled() {
            return Err(RagError::Cancelled);
        }

        self.memory.push(turn);
        info!(
            path = ?answer.path,
            classification = %answer.classification,
            source_count = answer.source_fragments.len(),
            turn_count = self.memory.len(),
            "answered question"
        );
        Ok(answer)
    }

    async fn ensure_index(&mut self) -> Result<Arc<RecordIndex>> {
        let fingerprint = self.record.fingerprint();
        if let Some(index) = self.index.as_ref().filter(|index| index.fingerprint == fingerprint) {
            return Ok(Arc::clone(index));
        }

        let index = Arc::new(
            RecordIndex::build(
                &self.record,
                &self.config,
                &self.embedder,
                &self.completion,
                self.chunker.as_ref(),
            )
            .await?,
        );
        self.index = Some(Arc::clone(&index));
        Ok(index)
    }

    async fn run_turn(
        &self,
        index: &RecordIndex,
        question: &str,
    ) -> Result<(Answer, ConversationTurn)> {
        let (classification, attribute_hits, hierarchical_hits) = tokio::try_join!(
            self.classifier.classify(question),
            index.attribute.relevant_fragments(question),
            index.hierarchical.relevant_fragments(question),
        )?;

        let candidates = if attribute_hits.is_empty() { hierarchical_hits } else { attribute_hits };
        let outcome = RetrievalOutcome::select(classification, candidates, &index.fragments);
        let path = outcome.path();

        let output = self.chain.run(question, outcome.fragments(), &self.memory).await?;
        let refined = self.refiner.refine(question, &output.context, &output.answer).await?;
        let turn = output.to_turn();

        let answer = Answer {
            answer: refined,
            source_fragments: output.sources,
            path,
            classification,
            standalone_question: output.standalone_question,
        };
        Ok((answer, turn))
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("config", &self.config)
            .field("record", &self.record.company)
            .field("indexed", &self.index.is_some())
            .field("turns", &self.memory.len())
            .finish()
    }
}

/// Builder for constructing a [`ChatSession`].
///
/// The embedding provider, completion provider and record are required. The
/// config defaults to [`ChatConfig::default`] and the chunker to a
/// [`FixedSizeChunker`] sized from the config.
#[derive(Default)]
pub struct ChatSessionBuilder {
    config: Option<ChatConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
    record: Option<WorkRecord>,
}

impl ChatSessionBuilder {
    /// Set the session configuration.
    pub fn config(mut self, config: ChatConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the completion provider.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Override the child-chunk splitter.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the record to chat about.
    pub fn record(mut self, record: WorkRecord) -> Self {
        self.record = Some(record);
        self
    }

    /// Build the [`ChatSession`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing or the
    /// config is invalid.
    pub fn build(self) -> Result<ChatSession> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedder = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let completion = self
            .completion_provider
            .ok_or_else(|| RagError::ConfigError("completion_provider is required".to_string()))?;
        let record =
            self.record.ok_or_else(|| RagError::ConfigError("record is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(FixedSizeChunker::new(config.child_chunk_size, config.child_chunk_overlap))
        });

        Ok(ChatSession {
            classifier: QueryClassifier::new(Arc::clone(&completion)),
            chain: ConversationalQaChain::new(Arc::clone(&completion), config.persona.clone()),
            refiner: AnswerRefiner::new(Arc::clone(&completion), config.refine_tier),
            config,
            embedder,
            completion,
            chunker,
            record,
            index: None,
            memory: ConversationMemory::new(),
        })
    }
}
