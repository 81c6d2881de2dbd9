//! Short-term conversation memory for a single chat session.

use serde::{Deserialize, Serialize};

/// One answered question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    /// The question exactly as the user asked it.
    pub question: String,
    /// The answer the chain generated for it.
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into() }
    }
}

/// Ordered, append-only buffer of [`ConversationTurn`]s.
///
/// Turns can only be added at the end; there is no way to edit or remove an
/// individual turn. The whole buffer is dropped when the session ends.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end of the buffer.
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Render the history as alternating `Human:` / `Assistant:` lines.
    pub fn serialize(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_arrival_order() {
        let mut memory = ConversationMemory::new();
        assert_eq!(memory.serialize(), "");

        memory.push(ConversationTurn::new("q1", "a1"));
        memory.push(ConversationTurn::new("q2", "a2"));
        assert_eq!(memory.serialize(), "Human: q1\nAssistant: a1\nHuman: q2\nAssistant: a2");
        assert_eq!(memory.len(), 2);
    }
}
