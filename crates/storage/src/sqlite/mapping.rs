use prep_core::model::{Answer, ExamId, ExamResult};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn exam_id_from_str(s: &str) -> Result<ExamId, StorageError> {
    s.parse::<ExamId>().map_err(ser)
}

pub(crate) fn answers_to_json(answers: &[Answer]) -> Result<String, StorageError> {
    serde_json::to_string(answers).map_err(ser)
}

pub(crate) fn answers_from_json(raw: &str) -> Result<Vec<Answer>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn flags_to_json(flags: &[usize]) -> Result<String, StorageError> {
    serde_json::to_string(flags).map_err(ser)
}

pub(crate) fn flags_from_json(raw: &str) -> Result<Vec<usize>, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_result_row(row: &sqlx::sqlite::SqliteRow) -> Result<ExamResult, StorageError> {
    let exam_id = exam_id_from_str(row.try_get::<String, _>("exam_id").map_err(ser)?.as_str())?;
    let answers = answers_from_json(row.try_get::<String, _>("answers").map_err(ser)?.as_str())?;
    let flagged = flags_from_json(row.try_get::<String, _>("flagged").map_err(ser)?.as_str())?;

    let time_spent_i64: i64 = row.try_get("time_spent_seconds").map_err(ser)?;
    let time_spent = u32::try_from(time_spent_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid time_spent_seconds: {time_spent_i64}"))
    })?;

    let notes: String = row.try_get("notes").map_err(ser)?;

    ExamResult::from_persisted(exam_id, answers, flagged, time_spent, notes).map_err(ser)
}
