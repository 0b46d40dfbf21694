use async_trait::async_trait;
use prep_core::model::{ExamId, ExamResult};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Builds the namespaced scratch key for one persisted field of an exam
/// attempt, e.g. `exam-<uuid>-answers`.
///
/// Answers and flags live under separate keys so either can be overwritten
/// independently; readers tolerate one being absent.
#[must_use]
pub fn scratch_key(exam_id: ExamId, field: &str) -> String {
    format!("exam-{exam_id}-{field}")
}

/// Best-effort key-value scratch store for in-progress attempt snapshots.
///
/// Last-write-wins, no ordering or transactional guarantees. This cache is
/// never the source of truth for submission; callers treat a missing or
/// stale value as "no snapshot".
#[async_trait]
pub trait ScratchStore: Send + Sync {
    /// Overwrite the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write cannot be performed.
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;

    /// Fetch the value stored under `key`, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures; a missing key is not an
    /// error.
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
}

/// Recording side of finalized exam attempts.
///
/// Authoritative storage, scoring, and percentile computation live behind
/// this trait; the session core only constructs and hands off the payload.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Append a finalized result, returning its storage id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the result cannot be stored.
    async fn record_result(&self, result: &ExamResult) -> Result<i64, StorageError>;

    /// Fetch a previously recorded result by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError>;
}

/// Simple in-memory store implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    scratch: Arc<Mutex<HashMap<String, Value>>>,
    results: Arc<Mutex<Vec<ExamResult>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scratch: Arc::new(Mutex::new(HashMap::new())),
            results: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ScratchStore for InMemoryStore {
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut guard = self
            .scratch
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let guard = self
            .scratch
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }
}

#[async_trait]
impl ResultSink for InMemoryStore {
    async fn record_result(&self, result: &ExamResult) -> Result<i64, StorageError> {
        let mut guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(result.clone());
        i64::try_from(guard.len()).map_err(|_| StorageError::Serialization("id overflow".into()))
    }

    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError> {
        let guard = self
            .results
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let index = usize::try_from(id.checked_sub(1).ok_or(StorageError::NotFound)?)
            .map_err(|_| StorageError::NotFound)?;
        guard.get(index).cloned().ok_or(StorageError::NotFound)
    }
}

/// Aggregates the scratch store and result sink behind trait objects for
/// easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub scratch: Arc<dyn ScratchStore>,
    pub results: Arc<dyn ResultSink>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let store = InMemoryStore::new();
        let scratch: Arc<dyn ScratchStore> = Arc::new(store.clone());
        let results: Arc<dyn ResultSink> = Arc::new(store);
        Self { scratch, results }
    }
}
