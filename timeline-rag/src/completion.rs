//! Completion provider trait and model tiers.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which class of model a prompt is sent to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Low-latency model used for question rewriting and classification.
    Fast,
    /// Higher-quality model used for answer generation and refinement.
    Slow,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelTier::Fast => f.write_str("fast"),
            ModelTier::Slow => f.write_str("slow"),
        }
    }
}

/// A provider that turns a prompt into generated text.
///
/// The prompt is a single fully rendered string; the provider decides how to
/// wrap it for its backend (e.g. as one user message of a chat request).
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a completion for `prompt` using a model of the given tier.
    async fn complete(&self, prompt: &str, tier: ModelTier) -> Result<String>;

    /// A short name used in logs and error messages.
    fn name(&self) -> &str {
        "completion"
    }
}
