use quiz_core::model::{AttemptId, CourseCode};

use super::SqliteRepository;
use super::mapping::{i64_from_u64, map_attempt_row, ser};
use crate::repository::{AttemptRecord, AttemptRepository, StorageError};

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &AttemptRecord) -> Result<AttemptId, StorageError> {
        let questions_data = serde_json::to_string(&attempt.questions_data).map_err(ser)?;
        let time_taken = attempt
            .time_taken
            .map(|v| i64_from_u64("time_taken", v))
            .transpose()?;

        sqlx::query(
            r"
                INSERT INTO test_attempts (
                    id, user_id, course_code, started_at, completed_at,
                    score, total_questions, time_taken, status, questions_data
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(attempt.id.to_string())
        .bind(attempt.user_id.map(|id| id.to_string()))
        .bind(&attempt.course_code)
        .bind(attempt.started_at)
        .bind(attempt.completed_at)
        .bind(i64::from(attempt.score))
        .bind(i64::from(attempt.total_questions))
        .bind(time_taken)
        .bind(attempt.status.as_deref())
        .bind(questions_data)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StorageError::Conflict
            } else {
                StorageError::Connection(e.to_string())
            }
        })?;

        Ok(attempt.attempt_id())
    }

    async fn recent_attempts(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r"
                SELECT
                    id, user_id, course_code, started_at, completed_at,
                    score, total_questions, time_taken, status, questions_data
                FROM test_attempts
                WHERE course_code = ?1
                ORDER BY COALESCE(completed_at, started_at) DESC, id
                LIMIT ?2
            ",
        )
        .bind(course.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_attempt_row).collect()
    }
}
