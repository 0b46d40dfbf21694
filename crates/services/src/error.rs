//! Shared error types for the services crate.

use thiserror::Error;

use prep_core::session::SessionError;
use storage::repository::StorageError;

/// Errors emitted by `SessionRunner`.
///
/// Only errors the caller must act on appear here: session validation
/// failures and result-recording failures. Autosave problems never surface
/// through this type; they are advisory (see `PersistenceWarning`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunnerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
