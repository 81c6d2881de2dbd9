//! Attribute-scoped retrieval driven by a model-built structured query.
//!
//! The model translates the question into free text plus an optional metadata
//! filter (e.g. `headline contains "migration"`). Only fragments passing the
//! filter are eligible; they are ranked by similarity to the free text. A
//! question that names no attribute yields no fragments, leaving the choice to
//! the other strategies.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::{CompletionProvider, ModelTier};
use crate::document::Fragment;
use crate::error::Result;
use crate::index::{SearchParams, SimilarityIndex};
use crate::prompts;
use crate::retriever::Retriever;

/// Fragment metadata fields a filter may reference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Attribute {
    Company,
    #[serde(alias = "job_title")]
    JobTitle,
    #[serde(alias = "start_date")]
    StartDate,
    #[serde(alias = "end_date")]
    EndDate,
    Headline,
    Skills,
}

/// How a filter value is compared against metadata. Comparisons ignore case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    #[default]
    Eq,
    Contains,
}

/// A single metadata predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeFilter {
    pub attribute: Attribute,
    #[serde(default)]
    pub comparator: Comparator,
    pub value: String,
}

impl AttributeFilter {
    /// Whether `fragment` satisfies this predicate.
    ///
    /// For [`Attribute::Skills`] the fragment matches if any of its skills does.
    pub fn matches(&self, fragment: &Fragment) -> bool {
        let metadata = &fragment.metadata;
        let expected = self.value.trim().to_lowercase();
        let compare = |actual: &str| {
            let actual = actual.trim().to_lowercase();
            match self.comparator {
                Comparator::Eq => actual == expected,
                Comparator::Contains => actual.contains(&expected),
            }
        };

        match self.attribute {
            Attribute::Company => compare(&metadata.company),
            Attribute::JobTitle => compare(&metadata.job_title),
            Attribute::StartDate => compare(&metadata.start_date),
            Attribute::EndDate => compare(&metadata.end_date),
            Attribute::Headline => compare(&metadata.headline),
            Attribute::Skills => metadata.skills.iter().any(|skill| compare(skill)),
        }
    }
}

/// The model's structured reading of a question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct StructuredQuery {
    /// Free text to rank eligible fragments by. May be empty.
    #[serde(default)]
    pub query: String,
    /// Optional metadata predicate.
    #[serde(default)]
    pub filter: Option<AttributeFilter>,
}

impl StructuredQuery {
    /// Parse model output, tolerating code fences and surrounding prose.
    ///
    /// Returns `None` if no JSON object in the expected shape can be found.
    pub fn parse(raw: &str) -> Option<Self> {
        let text = strip_json_fences(raw);
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }
        serde_json::from_str(&text[start..=end]).ok()
    }
}

/// Strips ```` ```json ... ``` ```` or ```` ``` ... ``` ```` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text.strip_prefix("```json").or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped.strip_suffix("```").map(str::trim).unwrap_or(stripped)
        }
        None => text,
    }
}

/// Self-query retriever over whole fragments.
pub struct AttributeRetriever {
    fragments: SimilarityIndex<Fragment>,
    completion: Arc<dyn CompletionProvider>,
    tier: ModelTier,
    top_k: usize,
}

impl AttributeRetriever {
    /// Create a retriever over an already built fragment index.
    pub fn new(
        fragments: SimilarityIndex<Fragment>,
        completion: Arc<dyn CompletionProvider>,
        tier: ModelTier,
        top_k: usize,
    ) -> Self {
        Self { fragments, completion, tier, top_k: top_k.max(1) }
    }

    /// Ask the model to structure `question`.
    ///
    /// Unusable output is logged and read as "no structure".
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn structure(&self, question: &str) -> Result<StructuredQuery> {
        let raw = self.completion.complete(&prompts::self_query(question), self.tier).await?;
        Ok(StructuredQuery::parse(&raw).unwrap_or_else(|| {
            warn!(output = %raw, "unparseable structured query, skipping attribute retrieval");
            StructuredQuery::default()
        }))
    }

    async fn rank(&self, query: &str, eligible: Vec<Fragment>) -> Result<Vec<Fragment>> {
        if query.trim().is_empty() || eligible.len() <= 1 {
            return Ok(eligible.into_iter().take(self.top_k).collect());
        }

        let all = self.fragments.len();
        let params = SearchParams {
            min_score: -1.0,
            initial_results: all,
            result_increment: all,
            max_results: all,
        };
        let ranked = self.fragments.search(query, &params).await?;
        Ok(ranked
            .into_iter()
            .map(|hit| hit.item)
            .filter(|fragment| eligible.contains(fragment))
            .take(self.top_k)
            .collect())
    }
}

impl std::fmt::Debug for AttributeRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeRetriever")
            .field("fragments", &self.fragments.len())
            .field("completion", &self.completion.name())
            .field("tier", &self.tier)
            .field("top_k", &self.top_k)
            .finish()
    }
}

#[async_trait]
impl Retriever for AttributeRetriever {
    async fn relevant_fragments(&self, question: &str) -> Result<Vec<Fragment>> {
        if self.fragments.is_empty() {
            return Ok(Vec::new());
        }

        let structured = self.structure(question).await?;
        let Some(filter) = structured.filter else {
            debug!("structured query has no filter");
            return Ok(Vec::new());
        };

        let eligible: Vec<Fragment> =
            self.fragments.items().filter(|fragment| filter.matches(fragment)).cloned().collect();
        debug!(?filter, eligible = eligible.len(), "attribute filter applied");
        if eligible.is_empty() {
            return Ok(eligible);
        }

        self.rank(&structured.query, eligible).await
    }
}
