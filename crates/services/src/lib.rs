#![forbid(unsafe_code)]

pub mod error;
pub mod schedule_service;
pub mod sessions;

pub use prep_core::Clock;

pub use error::RunnerError;
pub use schedule_service::ScheduleService;
pub use sessions::{PersistenceWarning, SessionProgress, SessionRunner};
