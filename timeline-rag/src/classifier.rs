//! Few-shot query intent classification.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::completion::{CompletionProvider, ModelTier};
use crate::error::Result;
use crate::prompts;

/// How broad a question is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QueryClass {
    /// About the role or experience as a whole.
    General,
    /// About a particular project, feature or accomplishment.
    Specific,
}

impl QueryClass {
    /// Read a model label. Only the exact labels `general` and `specific`
    /// (surrounding whitespace aside) are recognised.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "general" => Some(QueryClass::General),
            "specific" => Some(QueryClass::Specific),
            _ => None,
        }
    }
}

impl fmt::Display for QueryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryClass::General => f.write_str("general"),
            QueryClass::Specific => f.write_str("specific"),
        }
    }
}

/// Labels questions as [`QueryClass::General`] or [`QueryClass::Specific`]
/// with one call to the fast model.
pub struct QueryClassifier {
    completion: Arc<dyn CompletionProvider>,
}

impl QueryClassifier {
    pub fn new(completion: Arc<dyn CompletionProvider>) -> Self {
        Self { completion }
    }

    /// Classify `question`.
    ///
    /// Any label other than the two expected ones is logged and treated as
    /// [`QueryClass::General`], which always routes to the full fragment list.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn classify(&self, question: &str) -> Result<QueryClass> {
        let label = self.completion.complete(&prompts::classification(question), ModelTier::Fast).await?;
        match QueryClass::from_label(&label) {
            Some(class) => {
                debug!(%class, "classified question");
                Ok(class)
            }
            None => {
                warn!(label = %label.trim(), "malformed classification, defaulting to general");
                Ok(QueryClass::General)
            }
        }
    }
}

impl fmt::Debug for QueryClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClassifier").field("completion", &self.completion.name()).finish()
    }
}
