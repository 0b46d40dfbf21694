use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::{Answer, ExamDefinition, ExamResult};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Validation errors for session operations.
///
/// Both variants are recoverable at the call site and leave the state they
/// were called with untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("`{action}` is not allowed while the session is {from}")]
    InvalidTransition {
        action: &'static str,
        from: SessionStatus,
    },

    #[error("question index {index} out of range for {len} questions")]
    OutOfRange { index: usize, len: usize },
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle phase of an exam attempt.
///
/// `Submitted` and `TimedOut` are terminal: once reached, no operation may
/// mutate answers, flags, or the clock again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    Running,
    Submitted,
    TimedOut,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Submitted | SessionStatus::TimedOut)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::Running => "running",
            SessionStatus::Submitted => "submitted",
            SessionStatus::TimedOut => "timed out",
        };
        write!(f, "{label}")
    }
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Autosave payload: the recoverable portion of an in-progress attempt.
///
/// Never authoritative: it may be stale or absent, and submission does not
/// read it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub answers: Vec<Answer>,
    pub flagged: Vec<usize>,
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Immutable value describing one exam attempt at a point in time.
///
/// All session operations take a state by reference and return a fresh one;
/// whoever drives the session (see the services crate) owns the single
/// mutable slot. This keeps the state machine trivially testable and free of
/// any UI-framework re-render concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    current_index: usize,
    answers: Vec<Answer>,
    flagged: BTreeSet<usize>,
    remaining_seconds: u32,
    status: SessionStatus,
    notes: String,
}

impl SessionState {
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index)
    }

    #[must_use]
    pub fn is_flagged(&self, index: usize) -> bool {
        self.flagged.contains(&index)
    }

    /// Flagged question indices, ascending.
    #[must_use]
    pub fn flagged_indices(&self) -> Vec<usize> {
        self.flagged.iter().copied().collect()
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// Count of answers that are not `Unanswered`. Pure query.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_answered()).count()
    }

    /// The recoverable portion of this state, for autosave.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            answers: self.answers.clone(),
            flagged: self.flagged_indices(),
        }
    }
}

//
// ─── TICK OUTCOME ──────────────────────────────────────────────────────────────
//

/// Next state after a clock tick, plus the finalized result when this tick
/// exhausted the clock. `finalized` is `Some` exactly once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub state: SessionState,
    pub finalized: Option<ExamResult>,
}

//
// ─── EXAM SESSION ──────────────────────────────────────────────────────────────
//

/// Transition rules for a timed exam attempt.
///
/// Holds the immutable [`ExamDefinition`] and exposes every session
/// operation as a pure function from one [`SessionState`] to the next. The
/// session never owns a timer: the host calls [`ExamSession::tick`] once per
/// second (or a test calls it as many times as it likes).
#[derive(Debug, Clone)]
pub struct ExamSession {
    definition: ExamDefinition,
}

impl ExamSession {
    #[must_use]
    pub fn new(definition: ExamDefinition) -> Self {
        Self { definition }
    }

    #[must_use]
    pub fn definition(&self) -> &ExamDefinition {
        &self.definition
    }

    /// Fresh `NotStarted` state: full clock, every question unanswered,
    /// cursor on the first question.
    #[must_use]
    pub fn create(&self) -> SessionState {
        SessionState {
            current_index: 0,
            answers: vec![Answer::Unanswered; self.definition.question_count()],
            flagged: BTreeSet::new(),
            remaining_seconds: self.definition.duration_seconds(),
            status: SessionStatus::NotStarted,
            notes: String::new(),
        }
    }

    /// Fresh state seeded from an autosave snapshot.
    ///
    /// Snapshots are advisory: answers beyond the question count are
    /// dropped, missing slots filled as unanswered, out-of-range flags
    /// discarded. The clock always restarts in full and the state is
    /// `NotStarted`.
    #[must_use]
    pub fn restore(&self, snapshot: &SessionSnapshot) -> SessionState {
        let count = self.definition.question_count();
        let mut answers = snapshot.answers.clone();
        answers.truncate(count);
        answers.resize(count, Answer::Unanswered);

        let flagged = snapshot
            .flagged
            .iter()
            .copied()
            .filter(|&i| i < count)
            .collect();

        SessionState {
            current_index: 0,
            answers,
            flagged,
            remaining_seconds: self.definition.duration_seconds(),
            status: SessionStatus::NotStarted,
            notes: String::new(),
        }
    }

    /// Begin the attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the state is
    /// `NotStarted`.
    pub fn start(&self, state: &SessionState) -> Result<SessionState, SessionError> {
        if state.status != SessionStatus::NotStarted {
            return Err(SessionError::InvalidTransition {
                action: "start",
                from: state.status,
            });
        }
        let mut next = state.clone();
        next.status = SessionStatus::Running;
        Ok(next)
    }

    /// Advance the countdown by one second.
    ///
    /// A no-op unless the session is `Running`. When the decrement reaches
    /// zero the session times out and the finalized [`ExamResult`] rides
    /// along in the outcome; later ticks are no-ops again, so finalization
    /// fires exactly once.
    #[must_use]
    pub fn tick(&self, state: &SessionState) -> TickOutcome {
        if state.status != SessionStatus::Running {
            return TickOutcome {
                state: state.clone(),
                finalized: None,
            };
        }

        let mut next = state.clone();
        next.remaining_seconds = next.remaining_seconds.saturating_sub(1);
        if next.remaining_seconds == 0 {
            next.status = SessionStatus::TimedOut;
            let finalized = Some(self.finalize(&next));
            return TickOutcome {
                state: next,
                finalized,
            };
        }

        TickOutcome {
            state: next,
            finalized: None,
        }
    }

    /// Record an answer for the question at `index`.
    ///
    /// Leaves the cursor where it is.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is
    /// `Running`, and `SessionError::OutOfRange` if `index` does not address
    /// a question.
    pub fn select_answer(
        &self,
        state: &SessionState,
        index: usize,
        value: Answer,
    ) -> Result<SessionState, SessionError> {
        self.guard_running(state, "select_answer")?;
        self.guard_index(index)?;

        let mut next = state.clone();
        next.answers[index] = value;
        Ok(next)
    }

    /// Flip the review flag on the question at `index`.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`ExamSession::select_answer`].
    pub fn toggle_flag(
        &self,
        state: &SessionState,
        index: usize,
    ) -> Result<SessionState, SessionError> {
        self.guard_running(state, "toggle_flag")?;
        self.guard_index(index)?;

        let mut next = state.clone();
        if !next.flagged.remove(&index) {
            next.flagged.insert(index);
        }
        Ok(next)
    }

    /// Move the cursor to `target_index`, clamped into the valid range.
    ///
    /// Out-of-range targets are clamped rather than rejected: "next" past
    /// the last question is a harmless no-op for the host, unlike answering
    /// a non-existent question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` once the session is
    /// terminal.
    pub fn navigate(
        &self,
        state: &SessionState,
        target_index: i64,
    ) -> Result<SessionState, SessionError> {
        if state.status.is_terminal() {
            return Err(SessionError::InvalidTransition {
                action: "navigate",
                from: state.status,
            });
        }

        let last = self.definition.question_count() as i64 - 1;
        let clamped = target_index.clamp(0, last);

        let mut next = state.clone();
        next.current_index = usize::try_from(clamped).unwrap_or(0);
        Ok(next)
    }

    /// Replace the scratch notes buffer.
    ///
    /// Notes are independent of any answer and ride along into the final
    /// result payload.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` once the session is
    /// terminal.
    pub fn set_notes(
        &self,
        state: &SessionState,
        notes: impl Into<String>,
    ) -> Result<SessionState, SessionError> {
        if state.status.is_terminal() {
            return Err(SessionError::InvalidTransition {
                action: "set_notes",
                from: state.status,
            });
        }

        let mut next = state.clone();
        next.notes = notes.into();
        Ok(next)
    }

    /// Finish the attempt and build its result payload.
    ///
    /// Submission is always permitted regardless of completion; warning
    /// about unanswered questions is a host affordance, not a rule of the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if the session already
    /// ended (submitted or timed out).
    pub fn submit(
        &self,
        state: &SessionState,
    ) -> Result<(SessionState, ExamResult), SessionError> {
        if state.status.is_terminal() {
            return Err(SessionError::InvalidTransition {
                action: "submit",
                from: state.status,
            });
        }

        let mut next = state.clone();
        next.status = SessionStatus::Submitted;
        let result = self.finalize(&next);
        Ok((next, result))
    }

    /// Build the result payload from a terminal state.
    ///
    /// `remaining_seconds` never exceeds the duration, so the subtraction
    /// keeps `time_spent_seconds` within `[0, duration]`.
    fn finalize(&self, state: &SessionState) -> ExamResult {
        let duration = self.definition.duration_seconds();
        let time_spent = duration.saturating_sub(state.remaining_seconds);

        ExamResult::from_parts(
            self.definition.id(),
            state.answers.clone(),
            state.flagged_indices(),
            time_spent,
            state.notes.clone(),
        )
    }

    fn guard_running(
        &self,
        state: &SessionState,
        action: &'static str,
    ) -> Result<(), SessionError> {
        if state.status != SessionStatus::Running {
            return Err(SessionError::InvalidTransition {
                action,
                from: state.status,
            });
        }
        Ok(())
    }

    fn guard_index(&self, index: usize) -> Result<(), SessionError> {
        let len = self.definition.question_count();
        if index >= len {
            return Err(SessionError::OutOfRange { index, len });
        }
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, ExamDefinition, ExamId, Question, QuestionId};

    fn abcd() -> Vec<Choice> {
        vec![
            Choice::new("A", "first"),
            Choice::new("B", "second"),
            Choice::new("C", "third"),
            Choice::new("D", "fourth"),
        ]
    }

    fn exam(questions: usize, duration_seconds: u32) -> ExamSession {
        let questions = (0..questions)
            .map(|i| Question::single_choice(QuestionId::random(), format!("Q{i}"), abcd()))
            .collect();
        let definition =
            ExamDefinition::new(ExamId::random(), "Mock", duration_seconds, questions).unwrap();
        ExamSession::new(definition)
    }

    fn running(session: &ExamSession) -> SessionState {
        session.start(&session.create()).unwrap()
    }

    #[test]
    fn create_starts_fresh() {
        let session = exam(4, 600);
        let state = session.create();

        assert_eq!(state.status(), SessionStatus::NotStarted);
        assert_eq!(state.remaining_seconds(), 600);
        assert_eq!(state.current_index(), 0);
        assert_eq!(state.answered_count(), 0);
        assert!(state.flagged_indices().is_empty());
    }

    #[test]
    fn start_requires_not_started() {
        let session = exam(1, 60);
        let state = running(&session);

        let err = session.start(&state).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                action: "start",
                from: SessionStatus::Running,
            }
        );
    }

    #[test]
    fn mutations_require_running() {
        let session = exam(2, 60);
        let state = session.create();

        assert!(matches!(
            session.select_answer(&state, 0, Answer::choice("A")),
            Err(SessionError::InvalidTransition { action: "select_answer", .. })
        ));
        assert!(matches!(
            session.toggle_flag(&state, 0),
            Err(SessionError::InvalidTransition { action: "toggle_flag", .. })
        ));
    }

    #[test]
    fn tick_is_noop_before_start() {
        let session = exam(1, 60);
        let state = session.create();

        let outcome = session.tick(&state);
        assert_eq!(outcome.state, state);
        assert!(outcome.finalized.is_none());
    }

    #[test]
    fn tick_decrements_while_running() {
        let session = exam(1, 60);
        let mut state = running(&session);

        for expected in (0..60).rev() {
            let outcome = session.tick(&state);
            state = outcome.state;
            assert_eq!(state.remaining_seconds(), expected);
            assert!(state.remaining_seconds() <= 60);
        }
        assert_eq!(state.status(), SessionStatus::TimedOut);
    }

    #[test]
    fn out_of_range_rejected_without_mutation() {
        let session = exam(3, 60);
        let state = running(&session);

        let err = session
            .select_answer(&state, 3, Answer::choice("A"))
            .unwrap_err();
        assert_eq!(err, SessionError::OutOfRange { index: 3, len: 3 });

        let err = session.toggle_flag(&state, 99).unwrap_err();
        assert_eq!(err, SessionError::OutOfRange { index: 99, len: 3 });

        // failed calls handed back errors, not new states; original untouched
        assert_eq!(state.answered_count(), 0);
        assert!(state.flagged_indices().is_empty());
    }

    #[test]
    fn select_answer_keeps_cursor() {
        let session = exam(3, 60);
        let state = running(&session);
        let state = session.navigate(&state, 2).unwrap();

        let next = session
            .select_answer(&state, 0, Answer::choice("B"))
            .unwrap();
        assert_eq!(next.current_index(), 2);
        assert_eq!(next.answer(0), Some(&Answer::choice("B")));
    }

    #[test]
    fn toggle_flag_flips_membership() {
        let session = exam(2, 60);
        let state = running(&session);

        let flagged = session.toggle_flag(&state, 1).unwrap();
        assert!(flagged.is_flagged(1));

        let unflagged = session.toggle_flag(&flagged, 1).unwrap();
        assert!(!unflagged.is_flagged(1));
    }

    #[test]
    fn navigate_clamps_instead_of_erroring() {
        let session = exam(10, 60);
        let state = running(&session);

        assert_eq!(session.navigate(&state, -5).unwrap().current_index(), 0);
        assert_eq!(session.navigate(&state, 999).unwrap().current_index(), 9);
        assert_eq!(session.navigate(&state, 4).unwrap().current_index(), 4);
    }

    #[test]
    fn navigate_allowed_before_start_but_not_after_end() {
        let session = exam(3, 60);

        let fresh = session.create();
        assert_eq!(session.navigate(&fresh, 2).unwrap().current_index(), 2);

        let (submitted, _) = session.submit(&running(&session)).unwrap();
        assert!(matches!(
            session.navigate(&submitted, 0),
            Err(SessionError::InvalidTransition { action: "navigate", .. })
        ));
    }

    #[test]
    fn submit_round_trips_time_spent() {
        let session = exam(2, 120);
        let mut state = running(&session);
        for _ in 0..45 {
            state = session.tick(&state).state;
        }

        let (after, result) = session.submit(&state).unwrap();
        assert_eq!(after.status(), SessionStatus::Submitted);
        assert_eq!(
            result.time_spent_seconds() + after.remaining_seconds(),
            120
        );
    }

    #[test]
    fn submit_twice_is_rejected() {
        let session = exam(1, 60);
        let (submitted, _) = session.submit(&running(&session)).unwrap();

        let err = session.submit(&submitted).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                action: "submit",
                from: SessionStatus::Submitted,
            }
        );
    }

    #[test]
    fn answers_frozen_after_submit() {
        let session = exam(2, 60);
        let (submitted, _) = session.submit(&running(&session)).unwrap();

        assert!(matches!(
            session.select_answer(&submitted, 0, Answer::choice("A")),
            Err(SessionError::InvalidTransition { .. })
        ));
        assert!(matches!(
            session.set_notes(&submitted, "late thought"),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn scenario_partial_answers_flags_and_timing() {
        // 2-question exam, 120 seconds: answer Q0, flag Q1, 30 ticks, submit.
        let session = exam(2, 120);
        let mut state = running(&session);

        state = session
            .select_answer(&state, 0, Answer::choice("A"))
            .unwrap();
        state = session.toggle_flag(&state, 1).unwrap();
        for _ in 0..30 {
            let outcome = session.tick(&state);
            assert!(outcome.finalized.is_none());
            state = outcome.state;
        }

        let (_, result) = session.submit(&state).unwrap();
        assert_eq!(
            result.answers(),
            &[Answer::choice("A"), Answer::Unanswered]
        );
        assert_eq!(result.flagged_indices(), &[1]);
        assert_eq!(result.time_spent_seconds(), 30);
    }

    #[test]
    fn scenario_timeout_finalizes_exactly_once() {
        let session = exam(2, 120);
        let mut state = running(&session);
        state = session
            .select_answer(&state, 1, Answer::choice("D"))
            .unwrap();

        let mut finalized = Vec::new();
        for _ in 0..120 {
            let outcome = session.tick(&state);
            state = outcome.state;
            if let Some(result) = outcome.finalized {
                finalized.push(result);
            }
        }

        assert_eq!(state.status(), SessionStatus::TimedOut);
        assert_eq!(finalized.len(), 1);
        assert_eq!(finalized[0].time_spent_seconds(), 120);
        // the timeout kept the recorded answer
        assert_eq!(finalized[0].answers()[1], Answer::choice("D"));

        // tick 121: unchanged state, no duplicate finalize
        let after = session.tick(&state);
        assert_eq!(after.state, state);
        assert!(after.finalized.is_none());
    }

    #[test]
    fn notes_ride_into_result() {
        let session = exam(1, 60);
        let state = running(&session);
        let state = session.set_notes(&state, "check #2 again").unwrap();

        let (_, result) = session.submit(&state).unwrap();
        assert_eq!(result.notes(), "check #2 again");
    }

    #[test]
    fn restore_seeds_from_snapshot_and_clamps() {
        let session = exam(2, 120);
        let snapshot = SessionSnapshot {
            answers: vec![
                Answer::choice("A"),
                Answer::free_text("draft"),
                Answer::choice("C"),
            ],
            flagged: vec![1, 7],
        };

        let state = session.restore(&snapshot);
        assert_eq!(state.status(), SessionStatus::NotStarted);
        assert_eq!(state.remaining_seconds(), 120);
        assert_eq!(state.answers().len(), 2);
        assert_eq!(state.answer(0), Some(&Answer::choice("A")));
        assert_eq!(state.flagged_indices(), vec![1]);
    }

    #[test]
    fn snapshot_captures_answers_and_flags() {
        let session = exam(2, 60);
        let mut state = running(&session);
        state = session
            .select_answer(&state, 0, Answer::free_text("17"))
            .unwrap();
        state = session.toggle_flag(&state, 0).unwrap();

        let snapshot = state.snapshot();
        assert_eq!(snapshot.answers[0], Answer::free_text("17"));
        assert_eq!(snapshot.flagged, vec![0]);
    }
}
