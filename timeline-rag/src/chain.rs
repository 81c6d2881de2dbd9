//! Two-stage conversational question answering.
//!
//! Stage one rewrites a follow-up into a standalone question using the
//! conversation so far (fast model, skipped on the first turn). Stage two
//! answers it from the supplied fragments only (slow model).

use std::sync::Arc;

use tracing::debug;

use crate::completion::{CompletionProvider, ModelTier};
use crate::document::Fragment;
use crate::error::Result;
use crate::memory::{ConversationMemory, ConversationTurn};
use crate::prompts;

/// Render fragments as prompt context.
///
/// Fragments are separated by blank lines; each is followed by a
/// `Skills: ...` line when it lists any skills.
pub fn serialize_context(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|fragment| {
            if fragment.metadata.skills.is_empty() {
                fragment.content.clone()
            } else {
                format!("{}\nSkills: {}", fragment.content, fragment.metadata.skills.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Everything one chain run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    /// The question as the user asked it.
    pub original_question: String,
    /// The question the answer model actually saw.
    pub standalone_question: String,
    /// The generated answer, before refinement.
    pub answer: String,
    /// The serialized context handed to the answer model.
    pub context: String,
    /// The fragments the context was built from.
    pub sources: Vec<Fragment>,
}

impl ChainOutput {
    /// The memory entry this run contributes: original question, unrefined answer.
    pub fn to_turn(&self) -> ConversationTurn {
        ConversationTurn::new(&self.original_question, &self.answer)
    }
}

/// Rewrite-then-answer chain.
pub struct ConversationalQaChain {
    completion: Arc<dyn CompletionProvider>,
    persona: Option<String>,
}

impl ConversationalQaChain {
    pub fn new(completion: Arc<dyn CompletionProvider>, persona: Option<String>) -> Self {
        Self { completion, persona }
    }

    /// Produce a standalone version of `question`.
    ///
    /// With no history the question passes through untouched and the model is
    /// not called. An empty rewrite also falls back to the original question.
    pub async fn rewrite(&self, question: &str, memory: &ConversationMemory) -> Result<String> {
        if memory.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = prompts::rewrite_question(&memory.serialize(), question);
        let rewritten = self.completion.complete(&prompt, ModelTier::Fast).await?;
        let rewritten = rewritten.trim();
        if rewritten.is_empty() {
            return Ok(question.to_string());
        }
        debug!(original = question, standalone = rewritten, "rewrote follow-up question");
        Ok(rewritten.to_string())
    }

    /// Run both stages for `question` against `fragments`.
    ///
    /// Memory is only read here; committing the turn is up to the caller.
    ///
    /// # Errors
    ///
    /// Propagates provider failures from either stage.
    pub async fn run(
        &self,
        question: &str,
        fragments: &[Fragment],
        memory: &ConversationMemory,
    ) -> Result<ChainOutput> {
        let standalone_question = self.rewrite(question, memory).await?;
        let context = serialize_context(fragments);

        let prompt = prompts::answer(
            self.persona.as_deref(),
            &context,
            &memory.serialize(),
            &standalone_question,
        );
        let answer = self.completion.complete(&prompt, ModelTier::Slow).await?.trim().to_string();
        debug!(fragment_count = fragments.len(), answer_len = answer.len(), "generated answer");

        Ok(ChainOutput {
            original_question: question.to_string(),
            standalone_question,
            answer,
            context,
            sources: fragments.to_vec(),
        })
    }
}

impl std::fmt::Debug for ConversationalQaChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationalQaChain")
            .field("completion", &self.completion.name())
            .field("persona", &self.persona)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FragmentMetadata;

    #[test]
    fn context_tags_skills_per_fragment() {
        let with_skills = Fragment {
            content: "Led migration: moved billing".into(),
            metadata: FragmentMetadata {
                skills: vec!["SQL".into(), "planning".into()],
                ..FragmentMetadata::default()
            },
        };
        let without = Fragment { content: "Mentored juniors".into(), metadata: FragmentMetadata::default() };

        assert_eq!(
            serialize_context(&[with_skills, without]),
            "Led migration: moved billing\nSkills: SQL, planning\n\nMentored juniors"
        );
        assert_eq!(serialize_context(&[]), "");
    }
}
