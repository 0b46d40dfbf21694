use chrono::Utc;
use prep_core::model::ExamResult;

use super::SqliteStore;
use super::mapping::{answers_to_json, flags_to_json, map_result_row};
use crate::repository::{ResultSink, StorageError};

#[async_trait::async_trait]
impl ResultSink for SqliteStore {
    async fn record_result(&self, result: &ExamResult) -> Result<i64, StorageError> {
        let answers = answers_to_json(result.answers())?;
        let flagged = flags_to_json(result.flagged_indices())?;

        let res = sqlx::query(
            r"
                INSERT INTO exam_results (
                    exam_id, answers, flagged, time_spent_seconds, notes, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(result.exam_id().to_string())
        .bind(answers)
        .bind(flagged)
        .bind(i64::from(result.time_spent_seconds()))
        .bind(result.notes())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_result(&self, id: i64) -> Result<ExamResult, StorageError> {
        let row = sqlx::query(
            r"
                SELECT exam_id, answers, flagged, time_spent_seconds, notes
                FROM exam_results
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_result_row(&row)
    }
}
