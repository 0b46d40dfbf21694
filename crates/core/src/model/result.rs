use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::Answer;
use crate::model::ids::ExamId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamResultError {
    #[error("flagged index {index} out of range for {len} answers")]
    FlagOutOfRange { index: usize, len: usize },
}

/// Finalized payload of one exam attempt.
///
/// Produced exactly once per session, by explicit submission or by the
/// timeout path, and handed to the result-recording collaborator. Scoring
/// and percentile computation happen downstream; this is only the record of
/// what the student did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamResult {
    exam_id: ExamId,
    answers: Vec<Answer>,
    flagged_indices: Vec<usize>,
    time_spent_seconds: u32,
    notes: String,
}

impl ExamResult {
    /// Rehydrate a result from persisted storage, re-checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `ExamResultError::FlagOutOfRange` if a flagged index does not
    /// address an answer slot.
    pub fn from_persisted(
        exam_id: ExamId,
        answers: Vec<Answer>,
        mut flagged_indices: Vec<usize>,
        time_spent_seconds: u32,
        notes: String,
    ) -> Result<Self, ExamResultError> {
        if let Some(&index) = flagged_indices.iter().find(|&&i| i >= answers.len()) {
            return Err(ExamResultError::FlagOutOfRange {
                index,
                len: answers.len(),
            });
        }
        flagged_indices.sort_unstable();

        Ok(Self::from_parts(
            exam_id,
            answers,
            flagged_indices,
            time_spent_seconds,
            notes,
        ))
    }

    /// Assemble a result from session internals. Callers uphold the bounds
    /// invariants; the session finalize path always does.
    pub(crate) fn from_parts(
        exam_id: ExamId,
        answers: Vec<Answer>,
        flagged_indices: Vec<usize>,
        time_spent_seconds: u32,
        notes: String,
    ) -> Self {
        Self {
            exam_id,
            answers,
            flagged_indices,
            time_spent_seconds,
            notes,
        }
    }

    #[must_use]
    pub fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Flagged question indices, ascending.
    #[must_use]
    pub fn flagged_indices(&self) -> &[usize] {
        &self.flagged_indices
    }

    #[must_use]
    pub fn time_spent_seconds(&self) -> u32 {
        self.time_spent_seconds
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Count of answers that are not `Unanswered`.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_persisted_accepts_valid_payload() {
        let result = ExamResult::from_persisted(
            ExamId::random(),
            vec![Answer::choice("A"), Answer::Unanswered],
            vec![1],
            30,
            String::new(),
        )
        .unwrap();

        assert_eq!(result.answered_count(), 1);
        assert_eq!(result.flagged_indices(), &[1]);
        assert_eq!(result.time_spent_seconds(), 30);
    }

    #[test]
    fn from_persisted_sorts_flags() {
        let result = ExamResult::from_persisted(
            ExamId::random(),
            vec![Answer::Unanswered, Answer::Unanswered, Answer::Unanswered],
            vec![2, 0],
            5,
            String::new(),
        )
        .unwrap();
        assert_eq!(result.flagged_indices(), &[0, 2]);
    }

    #[test]
    fn from_persisted_rejects_out_of_range_flag() {
        let err = ExamResult::from_persisted(
            ExamId::random(),
            vec![Answer::Unanswered, Answer::Unanswered],
            vec![2],
            0,
            String::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ExamResultError::FlagOutOfRange { index: 2, len: 2 }));
    }
}
