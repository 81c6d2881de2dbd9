//! Post-processing of generated answers for tone and readability.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::completion::{CompletionProvider, ModelTier};
use crate::error::Result;
use crate::prompts;

/// Rewrites a raw answer for grammar, paragraphing and tone.
///
/// The same context the answer was generated from is re-supplied so the
/// rewrite stays grounded.
pub struct AnswerRefiner {
    completion: Arc<dyn CompletionProvider>,
    tier: ModelTier,
}

impl AnswerRefiner {
    pub fn new(completion: Arc<dyn CompletionProvider>, tier: ModelTier) -> Self {
        Self { completion, tier }
    }

    /// Polish `raw_answer`.
    ///
    /// Never returns an empty string: an empty refinement falls back to the raw
    /// answer, and an empty raw answer to the clarification reply.
    ///
    /// # Errors
    ///
    /// Propagates provider failures.
    pub async fn refine(&self, original_question: &str, context: &str, raw_answer: &str) -> Result<String> {
        let prompt = prompts::refine(context, original_question, raw_answer);
        let refined = self.completion.complete(&prompt, self.tier).await?;
        let refined = refined.trim();

        if !refined.is_empty() {
            debug!(raw_len = raw_answer.len(), refined_len = refined.len(), "refined answer");
            return Ok(refined.to_string());
        }

        warn!("refiner returned nothing, keeping the raw answer");
        let raw = raw_answer.trim();
        if raw.is_empty() {
            Ok(prompts::CLARIFICATION_REPLY.to_string())
        } else {
            Ok(raw.to_string())
        }
    }
}

impl std::fmt::Debug for AnswerRefiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerRefiner")
            .field("completion", &self.completion.name())
            .field("tier", &self.tier)
            .finish()
    }
}
