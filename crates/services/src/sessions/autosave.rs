use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

use prep_core::model::ExamId;
use prep_core::session::SessionSnapshot;
use storage::repository::{ScratchStore, StorageError, scratch_key};

/// Advisory notice that a scratch-store write failed.
///
/// Reported through logging, never through the mutating call that triggered
/// the write, and never retried: the next mutation's autosave overwrites the
/// store with fresher data anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub key: String,
    pub reason: String,
}

impl fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "autosave of `{}` failed: {}", self.key, self.reason)
    }
}

/// Fire-and-forget snapshot writer for one exam attempt.
///
/// Writes land on separate keys for answers and flags, mirroring how the
/// scratch store is consumed; two in-flight writes may race, which is fine
/// under last-write-wins because each carries a full snapshot.
pub(crate) struct Autosaver {
    scratch: Arc<dyn ScratchStore>,
    answers_key: String,
    flagged_key: String,
    failures: Arc<AtomicU64>,
}

impl Autosaver {
    pub(crate) fn new(scratch: Arc<dyn ScratchStore>, exam_id: ExamId) -> Self {
        Self {
            scratch,
            answers_key: scratch_key(exam_id, "answers"),
            flagged_key: scratch_key(exam_id, "flagged"),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of autosave writes that have failed so far.
    pub(crate) fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Spawn a write of the snapshot onto the ambient runtime and return
    /// immediately. Failures are logged and counted, nothing else.
    pub(crate) fn save(&self, snapshot: SessionSnapshot) {
        let scratch = Arc::clone(&self.scratch);
        let failures = Arc::clone(&self.failures);
        let answers_key = self.answers_key.clone();
        let flagged_key = self.flagged_key.clone();

        tokio::spawn(async move {
            let answers = match serde_json::to_value(&snapshot.answers) {
                Ok(value) => value,
                Err(e) => {
                    report(&failures, PersistenceWarning {
                        key: answers_key,
                        reason: e.to_string(),
                    });
                    return;
                }
            };
            let flagged = match serde_json::to_value(&snapshot.flagged) {
                Ok(value) => value,
                Err(e) => {
                    report(&failures, PersistenceWarning {
                        key: flagged_key,
                        reason: e.to_string(),
                    });
                    return;
                }
            };

            if let Err(e) = scratch.set(&answers_key, answers).await {
                report(&failures, PersistenceWarning {
                    key: answers_key,
                    reason: e.to_string(),
                });
            }
            if let Err(e) = scratch.set(&flagged_key, flagged).await {
                report(&failures, PersistenceWarning {
                    key: flagged_key,
                    reason: e.to_string(),
                });
            }
        });
    }

    /// Read back the most recent snapshot, if any.
    ///
    /// Treats an absent answers key as "no snapshot"; an absent flagged key
    /// just means nothing was flagged when the snapshot was taken.
    pub(crate) async fn load(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let Some(answers_value) = self.scratch.get(&self.answers_key).await? else {
            return Ok(None);
        };
        let answers = serde_json::from_value(answers_value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let flagged = match self.scratch.get(&self.flagged_key).await? {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| StorageError::Serialization(e.to_string()))?,
            None => Vec::new(),
        };

        Ok(Some(SessionSnapshot { answers, flagged }))
    }
}

fn report(failures: &AtomicU64, warning: PersistenceWarning) {
    failures.fetch_add(1, Ordering::Relaxed);
    warn!(key = %warning.key, reason = %warning.reason, "scratch autosave failed");
}
