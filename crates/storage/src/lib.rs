#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryStore, ResultSink, ScratchStore, Storage, StorageError, scratch_key,
};
pub use sqlite::{SqliteInitError, SqliteStore};
