use std::sync::Arc;

use tracing::{debug, warn};

use prep_core::model::{Answer, ExamDefinition, ExamResult};
use prep_core::session::{ExamSession, SessionError, SessionState};
use storage::repository::{ResultSink, ScratchStore};

use super::autosave::Autosaver;
use super::progress::SessionProgress;
use crate::error::RunnerError;

/// Drives one exam attempt end to end.
///
/// Owns the single mutable [`SessionState`] slot, applies the pure
/// transitions from `prep-core`, autosaves a snapshot after every
/// successful mutation (fire-and-forget), and hands the finalized
/// [`ExamResult`] to the result sink exactly once.
///
/// The runner never owns a timer: the host calls [`SessionRunner::tick`]
/// once per second. Mutating methods spawn autosaves onto the ambient tokio
/// runtime, so the runner must live inside one.
pub struct SessionRunner {
    session: ExamSession,
    state: SessionState,
    autosaver: Autosaver,
    results: Arc<dyn ResultSink>,
    pending_result: Option<ExamResult>,
    result_id: Option<i64>,
}

impl SessionRunner {
    /// Start from a clean state.
    #[must_use]
    pub fn new(
        definition: ExamDefinition,
        scratch: Arc<dyn ScratchStore>,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        let autosaver = Autosaver::new(scratch, definition.id());
        let session = ExamSession::new(definition);
        let state = session.create();
        Self {
            session,
            state,
            autosaver,
            results,
            pending_result: None,
            result_id: None,
        }
    }

    /// Start from the autosaved snapshot of a previous attempt, if one is
    /// readable; otherwise fall back to a clean state.
    ///
    /// Snapshots are a convenience cache, so a missing or corrupt one is
    /// only worth a log line, never an error.
    pub async fn resume(
        definition: ExamDefinition,
        scratch: Arc<dyn ScratchStore>,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        let autosaver = Autosaver::new(scratch, definition.id());
        let session = ExamSession::new(definition);

        let state = match autosaver.load().await {
            Ok(Some(snapshot)) => session.restore(&snapshot),
            Ok(None) => session.create(),
            Err(e) => {
                warn!(reason = %e, "ignoring unreadable autosave snapshot");
                session.create()
            }
        };

        Self {
            session,
            state,
            autosaver,
            results,
            pending_result: None,
            result_id: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn definition(&self) -> &ExamDefinition {
        self.session.definition()
    }

    /// Storage id of the recorded result, once finalization succeeded.
    #[must_use]
    pub fn result_id(&self) -> Option<i64> {
        self.result_id
    }

    /// The finalized result, once the attempt ended.
    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.pending_result.as_ref()
    }

    /// Number of autosave writes that failed so far. Advisory only.
    #[must_use]
    pub fn autosave_failures(&self) -> u64 {
        self.autosaver.failure_count()
    }

    /// Returns a summary of the current attempt progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.session.definition().question_count(),
            answered: self.state.answered_count(),
            flagged: self.state.flagged_indices().len(),
            remaining_seconds: self.state.remaining_seconds(),
            is_complete: self.state.status().is_terminal(),
        }
    }

    /// Begin the attempt.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Session` unless the attempt is fresh.
    pub fn start(&mut self) -> Result<(), RunnerError> {
        let next = self.session.start(&self.state)?;
        self.commit(next);
        Ok(())
    }

    /// Record an answer for the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Session` when the attempt is not running or
    /// the index is out of range.
    pub fn select_answer(&mut self, index: usize, value: Answer) -> Result<(), RunnerError> {
        let next = self.session.select_answer(&self.state, index, value)?;
        self.commit(next);
        Ok(())
    }

    /// Flip the review flag on the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Session` when the attempt is not running or
    /// the index is out of range.
    pub fn toggle_flag(&mut self, index: usize) -> Result<(), RunnerError> {
        let next = self.session.toggle_flag(&self.state, index)?;
        self.commit(next);
        Ok(())
    }

    /// Move the question cursor, clamped into range.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Session` once the attempt ended.
    pub fn navigate(&mut self, target_index: i64) -> Result<(), RunnerError> {
        let next = self.session.navigate(&self.state, target_index)?;
        self.commit(next);
        Ok(())
    }

    /// Replace the scratch notes buffer.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Session` once the attempt ended.
    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), RunnerError> {
        let next = self.session.set_notes(&self.state, notes)?;
        self.commit(next);
        Ok(())
    }

    /// Advance the countdown by one second.
    ///
    /// Returns the recorded result id when this tick exhausted the clock;
    /// ticks on an already-ended attempt are no-ops returning `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Storage` if the timed-out result cannot be
    /// recorded; the result stays pending and [`SessionRunner::finalize`]
    /// can retry.
    pub async fn tick(&mut self) -> Result<Option<i64>, RunnerError> {
        let outcome = self.session.tick(&self.state);
        if outcome.state != self.state {
            self.commit(outcome.state);
        }

        match outcome.finalized {
            Some(result) => {
                self.pending_result = Some(result);
                let id = self.record_pending().await?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Finish the attempt and record its result.
    ///
    /// Submission is permitted regardless of completion; blocking on
    /// unanswered questions is a host affordance.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Session` if the attempt already ended, or
    /// `RunnerError::Storage` if recording fails (the result stays pending
    /// and [`SessionRunner::finalize`] can retry).
    pub async fn submit(&mut self) -> Result<i64, RunnerError> {
        let (next, result) = self.session.submit(&self.state)?;
        self.commit(next);
        self.pending_result = Some(result);
        self.record_pending().await
    }

    /// Retry result recording after a failed submit or timeout handoff.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Session` if there is nothing to record, or
    /// `RunnerError::Storage` if persistence fails again.
    pub async fn finalize(&mut self) -> Result<i64, RunnerError> {
        if let Some(id) = self.result_id {
            return Ok(id);
        }
        self.record_pending().await
    }

    fn commit(&mut self, next: SessionState) {
        self.state = next;
        self.autosaver.save(self.state.snapshot());
    }

    async fn record_pending(&mut self) -> Result<i64, RunnerError> {
        let Some(result) = self.pending_result.as_ref() else {
            return Err(RunnerError::Session(SessionError::InvalidTransition {
                action: "finalize",
                from: self.state.status(),
            }));
        };

        let id = self.results.record_result(result).await?;
        self.result_id = Some(id);
        debug!(result_id = id, "exam result recorded");
        Ok(id)
    }
}
