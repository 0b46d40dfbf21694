use serde::{Deserialize, Serialize};

use crate::model::ids::ChoiceId;

/// Recorded answer state for one question.
///
/// Serialized into autosave snapshots and result payloads, hence the tagged
/// serde representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// No answer recorded yet. The default for every question.
    Unanswered,
    /// A selected choice of a single-choice question.
    Choice(ChoiceId),
    /// Typed response to a free-text question.
    FreeText(String),
}

impl Answer {
    /// Convenience constructor for a selected choice.
    #[must_use]
    pub fn choice(id: impl Into<String>) -> Self {
        Self::Choice(ChoiceId::new(id))
    }

    /// Convenience constructor for a typed response.
    #[must_use]
    pub fn free_text(text: impl Into<String>) -> Self {
        Self::FreeText(text.into())
    }

    /// Returns true unless this is `Unanswered`.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !matches!(self, Answer::Unanswered)
    }
}

impl Default for Answer {
    fn default() -> Self {
        Self::Unanswered
    }
}
