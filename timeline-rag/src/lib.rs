//! # timeline-rag
//!
//! Conversational question answering over a single work-history entry.
//!
//! A [`WorkRecord`] (company, title, dates, responsibilities and a list of
//! accomplishments) is split into [`Fragment`]s, indexed for similarity
//! search, and queried through a [`ChatSession`] that remembers the
//! conversation so follow-up questions make sense.
//!
//! ## Overview
//!
//! - [`EmbeddingProvider`] / [`CompletionProvider`] are the two backend seams.
//! - [`FragmentBuilder`] turns a record into searchable fragments.
//! - [`SimilarityIndex`] ranks items by cosine similarity with incremental
//!   widening of the result pool.
//! - [`HierarchicalRetriever`] searches small child chunks and returns their
//!   parent fragments; [`AttributeRetriever`] filters by metadata.
//! - [`QueryClassifier`] routes broad questions to the whole record.
//! - [`ConversationalQaChain`] and [`AnswerRefiner`] produce the reply.
//!
//! ## Features
//!
//! - `openai`: [`openai::OpenAIProvider`] over the OpenAI HTTP API.
//! - `full`: every optional feature.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use timeline_rag::{ChatSession, WorkRecord};
//!
//! let record: WorkRecord = serde_json::from_str(json)?;
//! let mut session = ChatSession::builder()
//!     .embedding_provider(Arc::new(embedder))
//!     .completion_provider(Arc::new(llm))
//!     .record(record)
//!     .build()?;
//!
//! let reply = session.ask("Which migration did you lead?").await?;
//! for source in &reply.source_fragments {
//!     println!("- {}", source.metadata.headline);
//! }
//! ```

pub mod attribute;
pub mod chain;
pub mod chunking;
pub mod classifier;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod fragment;
pub mod index;
pub mod memory;
pub mod prompts;
pub mod record;
pub mod refiner;
pub mod retriever;
pub mod session;

#[cfg(feature = "openai")]
pub mod openai;

pub use attribute::{Attribute, AttributeFilter, AttributeRetriever, Comparator, StructuredQuery};
pub use chain::{ChainOutput, ConversationalQaChain, serialize_context};
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use classifier::{QueryClass, QueryClassifier};
pub use completion::{CompletionProvider, ModelTier};
pub use config::{ChatConfig, ChatConfigBuilder};
pub use document::{Embeddable, Fragment, FragmentMetadata, ScoredItem, Section};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use fragment::{FragmentBuilder, FragmentContent, build_fragments};
pub use index::{SearchParams, SimilarityIndex};
pub use memory::{ConversationMemory, ConversationTurn};
pub use record::{Accomplishment, WorkRecord};
pub use refiner::AnswerRefiner;
pub use retriever::{HierarchicalRetriever, Retriever};
pub use session::{Answer, ChatSession, ChatSessionBuilder, RetrievalOutcome, RetrievalPath};
pub use tokio_util::sync::CancellationToken;
