//! The retrieval contract shared by every strategy, and the hierarchical strategy.
//!
//! [`HierarchicalRetriever`] matches queries against small child chunks, which
//! suit narrow questions, then hands back the whole parent [`Fragment`] so the
//! model sees the full story.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::chunking::Chunker;
use crate::document::{Embeddable, Fragment};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::{SearchParams, SimilarityIndex};

/// A strategy that selects fragments relevant to a query.
///
/// An empty result means "nothing relevant", not a failure.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return relevant fragments, most relevant first.
    async fn relevant_fragments(&self, query: &str) -> Result<Vec<Fragment>>;
}

/// A sub-span of a fragment's content. Never leaves the retriever.
#[derive(Debug, Clone)]
struct ChildChunk {
    /// Position of the owning fragment in `HierarchicalRetriever::parents`.
    parent: usize,
    text: String,
}

impl Embeddable for ChildChunk {
    fn embedding_text(&self) -> &str {
        &self.text
    }
}

/// Parent-document retriever over child chunks.
///
/// # Example
///
/// ```rust,ignore
/// use timeline_rag::{FixedSizeChunker, HierarchicalRetriever, Retriever};
///
/// let retriever = HierarchicalRetriever::build(
///     embedder,
///     &FixedSizeChunker::new(50, 0),
///     fragments,
///     config.child_search_params(),
///     config.max_parents,
/// )
/// .await?;
/// let fragments = retriever.relevant_fragments("billing migration").await?;
/// ```
#[derive(Debug)]
pub struct HierarchicalRetriever {
    parents: Vec<Fragment>,
    children: SimilarityIndex<ChildChunk>,
    params: SearchParams,
    max_parents: usize,
}

impl HierarchicalRetriever {
    /// Split every fragment with `chunker`, embed the pieces and index them.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`](crate::RagError::EmbeddingError)
    /// if the child chunks cannot be embedded.
    pub async fn build(
        provider: Arc<dyn EmbeddingProvider>,
        chunker: &dyn Chunker,
        fragments: Vec<Fragment>,
        params: SearchParams,
        max_parents: usize,
    ) -> Result<Self> {
        let children: Vec<ChildChunk> = fragments
            .iter()
            .enumerate()
            .flat_map(|(parent, fragment)| {
                chunker
                    .split(&fragment.content)
                    .into_iter()
                    .filter(|text| !text.trim().is_empty())
                    .map(move |text| ChildChunk { parent, text })
            })
            .collect();

        debug!(parent_count = fragments.len(), child_count = children.len(), "indexing child chunks");
        let children = SimilarityIndex::build(provider, children).await?;

        Ok(Self { parents: fragments, children, params, max_parents })
    }

    /// Number of indexed child chunks.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The fragments child chunks resolve to, in build order.
    pub fn parents(&self) -> &[Fragment] {
        &self.parents
    }
}

#[async_trait]
impl Retriever for HierarchicalRetriever {
    async fn relevant_fragments(&self, query: &str) -> Result<Vec<Fragment>> {
        let hits = self.children.search(query, &self.params).await?;

        let mut seen = HashSet::new();
        let fragments: Vec<Fragment> = hits
            .iter()
            .filter(|hit| seen.insert(hit.item.parent))
            .take(self.max_parents)
            .map(|hit| self.parents[hit.item.parent].clone())
            .collect();

        debug!(child_hits = hits.len(), parent_count = fragments.len(), "hierarchical retrieval");
        Ok(fragments)
    }
}
