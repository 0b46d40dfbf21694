#![forbid(unsafe_code)]

pub mod model;
pub mod schedule;
pub mod session;
pub mod time;

pub use session::{ExamSession, SessionError, SessionSnapshot, SessionState, SessionStatus, TickOutcome};
pub use time::Clock;
