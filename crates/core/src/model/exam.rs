use thiserror::Error;

use crate::model::ids::{ChoiceId, ExamId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while validating an exam definition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExamError {
    #[error("exam duration must be greater than zero")]
    ZeroDuration,

    #[error("exam has no questions")]
    NoQuestions,

    #[error("single-choice question at index {index} has no choices")]
    EmptyChoices { index: usize },
}

//
// ─── CHOICES AND QUESTIONS ─────────────────────────────────────────────────────
//

/// One selectable option of a single-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
}

impl Choice {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: ChoiceId::new(id),
            text: text.into(),
        }
    }
}

/// How a question expects to be answered.
///
/// The exam bank mixes multiple-choice questions with free-response prompts
/// that capture typed text, so both are first-class here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Exactly one choice may be selected from the listed options.
    SingleChoice { choices: Vec<Choice> },
    /// Free-form typed answer, no predefined options.
    FreeText,
}

/// A single exam question.
///
/// `passage` carries the shared reading passage for reading-comprehension
/// sections; `topic` is an optional tag used for per-topic score breakdowns
/// downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub passage: Option<String>,
    pub kind: QuestionKind,
    pub topic: Option<String>,
}

impl Question {
    /// Builds a single-choice question with the given options.
    #[must_use]
    pub fn single_choice(id: QuestionId, text: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self {
            id,
            text: text.into(),
            passage: None,
            kind: QuestionKind::SingleChoice { choices },
            topic: None,
        }
    }

    /// Builds a free-response question.
    #[must_use]
    pub fn free_text(id: QuestionId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            passage: None,
            kind: QuestionKind::FreeText,
            topic: None,
        }
    }

    #[must_use]
    pub fn with_passage(mut self, passage: impl Into<String>) -> Self {
        self.passage = Some(passage.into());
        self
    }

    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Choices of a single-choice question, empty slice for free text.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        match &self.kind {
            QuestionKind::SingleChoice { choices } => choices,
            QuestionKind::FreeText => &[],
        }
    }
}

//
// ─── EXAM DEFINITION ───────────────────────────────────────────────────────────
//

/// Immutable definition of a timed practice exam.
///
/// Validated once at construction; every session for this exam shares the
/// same ordered question list and duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamDefinition {
    id: ExamId,
    title: String,
    duration_seconds: u32,
    questions: Vec<Question>,
}

impl ExamDefinition {
    /// Create a validated exam definition.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::ZeroDuration` if `duration_seconds` is zero,
    /// `ExamError::NoQuestions` if the question list is empty, and
    /// `ExamError::EmptyChoices` if a single-choice question has no options.
    pub fn new(
        id: ExamId,
        title: impl Into<String>,
        duration_seconds: u32,
        questions: Vec<Question>,
    ) -> Result<Self, ExamError> {
        if duration_seconds == 0 {
            return Err(ExamError::ZeroDuration);
        }
        if questions.is_empty() {
            return Err(ExamError::NoQuestions);
        }
        for (index, question) in questions.iter().enumerate() {
            if let QuestionKind::SingleChoice { choices } = &question.kind {
                if choices.is_empty() {
                    return Err(ExamError::EmptyChoices { index });
                }
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            duration_seconds,
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> ExamId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
