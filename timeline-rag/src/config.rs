//! Configuration for a chat session.

use serde::{Deserialize, Serialize};

use crate::completion::ModelTier;
use crate::error::{RagError, Result};
use crate::fragment::FragmentContent;
use crate::index::SearchParams;

/// Configuration parameters for retrieval and generation.
///
/// Deserializes from partial input: missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Minimum child-chunk similarity for the hierarchical retriever.
    pub similarity_threshold: f32,
    /// First candidate pool size for child-chunk search.
    pub initial_results: usize,
    /// Growth of the candidate pool per expansion step.
    pub result_increment: usize,
    /// Child chunk size in characters.
    pub child_chunk_size: usize,
    /// Overlap between consecutive child chunks in characters.
    pub child_chunk_overlap: usize,
    /// Maximum number of parent fragments the hierarchical retriever returns.
    pub max_parents: usize,
    /// Maximum number of child chunks considered per query.
    pub max_children: usize,
    /// Maximum number of fragments the attribute retriever returns.
    pub attribute_top_k: usize,
    /// How accomplishment fragments are rendered.
    pub fragment_content: FragmentContent,
    /// Whether responsibility lines become fragments too.
    pub include_responsibilities: bool,
    /// Optional persona name given to the answer prompt.
    pub persona: Option<String>,
    /// Tier used to build structured attribute queries.
    pub attribute_tier: ModelTier,
    /// Tier used by the answer refiner.
    pub refine_tier: ModelTier,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            initial_results: 1,
            result_increment: 250,
            child_chunk_size: 50,
            child_chunk_overlap: 0,
            max_parents: 20,
            max_children: 100,
            attribute_top_k: 4,
            fragment_content: FragmentContent::HeadlineAndContext,
            include_responsibilities: false,
            persona: None,
            attribute_tier: ModelTier::Slow,
            refine_tier: ModelTier::Slow,
        }
    }
}

impl ChatConfig {
    /// Create a new builder for constructing a [`ChatConfig`].
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Check that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `similarity_threshold` is outside `[-1.0, 1.0]`
    /// - `child_chunk_overlap >= child_chunk_size`
    /// - any count (`initial_results`, `result_increment`, `max_parents`,
    ///   `max_children`, `attribute_top_k`) is zero
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(RagError::ConfigError(format!(
                "similarity_threshold ({}) must be within [-1, 1]",
                self.similarity_threshold
            )));
        }
        if self.child_chunk_overlap >= self.child_chunk_size {
            return Err(RagError::ConfigError(format!(
                "child_chunk_overlap ({}) must be less than child_chunk_size ({})",
                self.child_chunk_overlap, self.child_chunk_size
            )));
        }
        let counts = [
            ("initial_results", self.initial_results),
            ("result_increment", self.result_increment),
            ("max_parents", self.max_parents),
            ("max_children", self.max_children),
            ("attribute_top_k", self.attribute_top_k),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(RagError::ConfigError(format!("{name} must be greater than zero")));
        }
        Ok(())
    }

    /// Search parameters for the child-chunk index.
    pub fn child_search_params(&self) -> SearchParams {
        SearchParams {
            min_score: self.similarity_threshold,
            initial_results: self.initial_results,
            result_increment: self.result_increment,
            max_results: self.max_children,
        }
    }
}

/// Builder for constructing a validated [`ChatConfig`].
#[derive(Debug, Clone, Default)]
pub struct ChatConfigBuilder {
    config: ChatConfig,
}

impl ChatConfigBuilder {
    /// Set the minimum child-chunk similarity.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the initial candidate pool size.
    pub fn initial_results(mut self, n: usize) -> Self {
        self.config.initial_results = n;
        self
    }

    /// Set the candidate pool growth per expansion step.
    pub fn result_increment(mut self, n: usize) -> Self {
        self.config.result_increment = n;
        self
    }

    /// Set the child chunk size in characters.
    pub fn child_chunk_size(mut self, size: usize) -> Self {
        self.config.child_chunk_size = size;
        self
    }

    /// Set the overlap between child chunks in characters.
    pub fn child_chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.child_chunk_overlap = overlap;
        self
    }

    /// Set the maximum number of parent fragments returned.
    pub fn max_parents(mut self, n: usize) -> Self {
        self.config.max_parents = n;
        self
    }

    /// Set the maximum number of child chunks considered.
    pub fn max_children(mut self, n: usize) -> Self {
        self.config.max_children = n;
        self
    }

    /// Set the maximum number of attribute-scoped fragments returned.
    pub fn attribute_top_k(mut self, k: usize) -> Self {
        self.config.attribute_top_k = k;
        self
    }

    /// Set how accomplishment fragments are rendered.
    pub fn fragment_content(mut self, content: FragmentContent) -> Self {
        self.config.fragment_content = content;
        self
    }

    /// Include responsibility lines as fragments.
    pub fn include_responsibilities(mut self, include: bool) -> Self {
        self.config.include_responsibilities = include;
        self
    }

    /// Give the answer prompt a persona name.
    pub fn persona(mut self, name: impl Into<String>) -> Self {
        self.config.persona = Some(name.into());
        self
    }

    /// Set the tier used to build structured attribute queries.
    pub fn attribute_tier(mut self, tier: ModelTier) -> Self {
        self.config.attribute_tier = tier;
        self
    }

    /// Set the tier used by the answer refiner.
    pub fn refine_tier(mut self, tier: ModelTier) -> Self {
        self.config.refine_tier = tier;
        self
    }

    /// Build the [`ChatConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`ChatConfig::validate`].
    pub fn build(self) -> Result<ChatConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
