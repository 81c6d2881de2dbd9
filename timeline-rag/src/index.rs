//! In-memory nearest-neighbour index using cosine similarity.
//!
//! [`SimilarityIndex`] embeds every item once at build time and answers
//! thresholded queries by scanning all stored vectors. Items keep their
//! insertion order, which is also the tie-breaker between equal scores.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::{Embeddable, ScoredItem};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Breadth and threshold settings for a [`SimilarityIndex::search`].
///
/// The candidate pool starts at `initial_results` and grows by
/// `result_increment` while every candidate in the pool still clears
/// `min_score`, stopping once `max_results` candidates have been considered
/// or the whole index has been scanned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Minimum cosine similarity for an item to be returned.
    pub min_score: f32,
    /// Size of the first candidate pool.
    pub initial_results: usize,
    /// How much the candidate pool grows per expansion step.
    pub result_increment: usize,
    /// Upper bound on the number of returned items.
    pub max_results: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self { min_score: 0.0, initial_results: 4, result_increment: 4, max_results: 4 }
    }
}

struct Entry<T> {
    item: T,
    embedding: Vec<f32>,
}

/// An in-memory similarity index over items of type `T`.
///
/// Built once and read-only afterwards, so concurrent searches need no locking.
///
/// # Example
///
/// ```rust,ignore
/// use timeline_rag::{SimilarityIndex, SearchParams};
///
/// let index = SimilarityIndex::build(provider, fragments).await?;
/// let hits = index.search("database migration", &SearchParams::default()).await?;
/// ```
pub struct SimilarityIndex<T> {
    entries: Vec<Entry<T>>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for SimilarityIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityIndex")
            .field("len", &self.entries.len())
            .field("provider", &self.provider.name())
            .finish()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn validate_embedding(provider: &dyn EmbeddingProvider, embedding: &[f32]) -> Result<()> {
    let expected = provider.dimensions();
    let problem = if embedding.is_empty() {
        Some("empty vector".to_string())
    } else if expected > 0 && embedding.len() != expected {
        Some(format!("expected {expected} dimensions, got {}", embedding.len()))
    } else if embedding.iter().any(|x| !x.is_finite()) {
        Some("vector contains non-finite values".to_string())
    } else {
        None
    };

    match problem {
        Some(message) => {
            error!(provider = provider.name(), %message, "malformed embedding");
            Err(RagError::EmbeddingError {
                provider: provider.name().to_string(),
                message: format!("malformed embedding: {message}"),
            })
        }
        None => Ok(()),
    }
}

impl<T: Embeddable + Clone> SimilarityIndex<T> {
    /// Embed every item and build the index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails, returns a
    /// different number of vectors than items, or returns malformed vectors.
    /// No item is ever silently dropped.
    pub async fn build(provider: Arc<dyn EmbeddingProvider>, items: Vec<T>) -> Result<Self> {
        if items.is_empty() {
            debug!(provider = provider.name(), "built empty similarity index");
            return Ok(Self { entries: Vec::new(), provider });
        }

        let texts: Vec<&str> = items.iter().map(Embeddable::embedding_text).collect();
        let embeddings = provider.embed_batch(&texts).await?;

        if embeddings.len() != items.len() {
            error!(
                provider = provider.name(),
                expected = items.len(),
                received = embeddings.len(),
                "embedding count mismatch"
            );
            return Err(RagError::EmbeddingError {
                provider: provider.name().to_string(),
                message: format!(
                    "expected {} embeddings, received {}",
                    items.len(),
                    embeddings.len()
                ),
            });
        }

        for embedding in &embeddings {
            validate_embedding(provider.as_ref(), embedding)?;
        }

        let entries: Vec<Entry<T>> = items
            .into_iter()
            .zip(embeddings)
            .map(|(item, embedding)| Entry { item, embedding })
            .collect();

        debug!(provider = provider.name(), item_count = entries.len(), "built similarity index");
        Ok(Self { entries, provider })
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indexed items in insertion order.
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }

    /// Embed `query` and return items scoring at least `params.min_score`.
    ///
    /// Results are ordered by descending score; equal scores keep insertion
    /// order. An empty result is valid. Searching an empty index does not call
    /// the provider.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the query cannot be embedded.
    pub async fn search(&self, query: &str, params: &SearchParams) -> Result<Vec<ScoredItem<T>>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.provider.embed(query).await?;
        validate_embedding(self.provider.as_ref(), &query_embedding)?;
        Ok(self.search_by_embedding(&query_embedding, params))
    }

    /// Thresholded search using an already computed query embedding.
    pub fn search_by_embedding(
        &self,
        query_embedding: &[f32],
        params: &SearchParams,
    ) -> Vec<ScoredItem<T>> {
        let max_results = params.max_results;
        if self.entries.is_empty() || max_results == 0 {
            return Vec::new();
        }

        let mut ranked: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&entry.embedding, query_embedding)))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let increment = params.result_increment.max(1);
        let mut pool = params.initial_results.clamp(1, max_results);
        let passing = loop {
            let window = &ranked[..pool.min(ranked.len())];
            let passing = window.iter().take_while(|(_, score)| *score >= params.min_score).count();
            if passing < window.len() || pool >= max_results || pool >= ranked.len() {
                break passing;
            }
            pool = pool.saturating_add(increment).min(max_results);
        };

        debug!(pool, passing, index_len = self.entries.len(), "similarity search");

        ranked
            .into_iter()
            .take(passing)
            .map(|(i, score)| ScoredItem { item: self.entries[i].item.clone(), score })
            .collect()
    }
}
