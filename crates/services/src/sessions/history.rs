use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use quiz_core::model::{AttemptId, CourseCode};
use quiz_core::scoring::percentage_round_half_up;
use storage::repository::{AttemptRecord, AttemptRepository, InMemoryRepository};

use crate::error::SessionError;

/// Presentation-agnostic list item for a logged attempt.
///
/// The UI may format timestamps and durations as needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptListItem {
    pub id: AttemptId,
    pub course_code: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    pub score: u32,
    pub total: u32,
    /// `None` for attempts with no questions recorded.
    pub percentage: Option<u32>,
    pub time_taken: Option<u64>,
}

impl AttemptListItem {
    #[must_use]
    pub fn from_record(record: &AttemptRecord) -> Self {
        Self {
            id: record.attempt_id(),
            course_code: record.course_code.clone(),
            started_at: record.started_at,
            completed_at: record.completed_at,
            score: record.score,
            total: record.total_questions,
            percentage: percentage_round_half_up(record.score, record.total_questions).ok(),
            time_taken: record.time_taken,
        }
    }
}

/// Read-side facade over the attempt log.
#[derive(Clone)]
pub struct AttemptHistoryService {
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptHistoryService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { attempts }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()))
    }

    /// Load the most recent attempts for a course, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn recent_attempts(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<AttemptListItem>, SessionError> {
        let rows = self.attempts.recent_attempts(course, limit).await?;
        Ok(rows.iter().map(AttemptListItem::from_record).collect())
    }
}
