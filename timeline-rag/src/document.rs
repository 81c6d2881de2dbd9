//! Data types for retrievable fragments and scored search hits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which part of a work record a fragment was cut from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    /// An accomplishment's story.
    #[default]
    Accomplishments,
    /// A day-to-day responsibility line.
    Responsibilities,
}

impl Section {
    /// The lowercase name used in prompts and serialized metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Accomplishments => "accomplishments",
            Section::Responsibilities => "responsibilities",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to every [`Fragment`].
///
/// Carries enough of the owning record (company, title, dates) to identify it,
/// plus the accomplishment-level fields the fragment was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FragmentMetadata {
    pub company: String,
    pub job_title: String,
    pub start_date: String,
    pub end_date: String,
    /// Accomplishment headline. Empty for responsibility fragments.
    pub headline: String,
    /// Accomplishment skills. Empty for responsibility fragments.
    pub skills: Vec<String>,
    pub section: Section,
}

/// The unit of retrieval: a piece of text cut from a work record plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fragment {
    /// Text that gets embedded and handed to the model as context.
    pub content: String,
    /// Where the text came from.
    pub metadata: FragmentMetadata,
}

/// Anything a [`SimilarityIndex`](crate::index::SimilarityIndex) can embed.
pub trait Embeddable {
    /// The text to embed for this item.
    fn embedding_text(&self) -> &str;
}

impl Embeddable for Fragment {
    fn embedding_text(&self) -> &str {
        &self.content
    }
}

/// An item retrieved from a similarity index paired with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem<T> {
    /// The retrieved item.
    pub item: T,
    /// Cosine similarity between the query and the item (higher is more relevant).
    pub score: f32,
}
