use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use quiz_core::model::{
    AttemptId, CourseCode, OptionLabel, Question, QuestionError, QuestionId, ResultsSnapshot,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

/// Status written for attempts that reached the results screen.
pub const ATTEMPT_STATUS_COMPLETED: &str = "completed";

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

    #[error("backend responded with status {status}: {message}")]
    Backend { status: u16, message: String },
}

impl StorageError {
    /// True for failures worth retrying: transport errors, throttling and 5xx responses.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Connection(_) => true,
            StorageError::Backend { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<QuestionError> for StorageError {
    fn from(err: QuestionError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

//
// ─── ROW SHAPES ────────────────────────────────────────────────────────────────
//

/// Row of the `questions` table.
///
/// Mirrors the hosted table column names so REST payloads deserialize directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: Uuid,
    pub course_code: String,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        let [a, b, c, d] = question.options().clone();
        Self {
            id: question.id().value(),
            course_code: question.course_code().to_string(),
            question_text: question.text().to_owned(),
            option_a: a,
            option_b: b,
            option_c: c,
            option_d: d,
            correct_answer: question.correct().as_str().to_owned(),
            topic: Some(question.topic().to_owned()),
            difficulty_level: Some(question.difficulty().to_owned()),
            created_at: None,
        }
    }

    /// Convert the row into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for an empty course code, blank text, or a
    /// correct answer that is not one of `A`..`D`.
    pub fn into_question(self) -> Result<Question, QuestionError> {
        let course_code = CourseCode::new(self.course_code)?;
        let correct: OptionLabel = self.correct_answer.parse()?;
        Question::new(
            QuestionId::new(self.id),
            course_code,
            self.question_text,
            [self.option_a, self.option_b, self.option_c, self.option_d],
            correct,
            self.topic,
            self.difficulty_level,
        )
    }
}

/// Convert fetched question rows, skipping any that fail to decode or validate.
///
/// The hosted schema stores `correct_answer` as free text, so one bad row must
/// not make the whole course unavailable.
pub(crate) fn valid_questions<I>(course: &CourseCode, rows: I) -> Vec<Question>
where
    I: IntoIterator<Item = Result<QuestionRecord, StorageError>>,
{
    rows.into_iter()
        .filter_map(|row| {
            let id = row.as_ref().map(|r| r.id).ok();
            match row.and_then(|r| r.into_question().map_err(StorageError::from)) {
                Ok(question) => Some(question),
                Err(err) => {
                    match id {
                        Some(id) => warn!("skipping question {id} for {course}: {err}"),
                        None => warn!("skipping unreadable question row for {course}: {err}"),
                    }
                    None
                }
            }
        })
        .collect()
}

/// Row of the `test_attempts` table: one finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub course_code: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub score: u32,
    pub total_questions: u32,
    #[serde(default)]
    pub time_taken: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
    pub questions_data: serde_json::Value,
}

impl AttemptRecord {
    /// Build a row from a results snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the per-question breakdown cannot
    /// be encoded as JSON.
    pub fn from_snapshot(
        id: AttemptId,
        user_id: Option<Uuid>,
        snapshot: &ResultsSnapshot,
    ) -> Result<Self, StorageError> {
        let questions_data = serde_json::to_value(snapshot.questions())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Self {
            id: id.value(),
            user_id,
            course_code: snapshot.course_code().to_string(),
            started_at: snapshot.started_at(),
            completed_at: Some(snapshot.completed_at()),
            score: snapshot.score(),
            total_questions: snapshot.total(),
            time_taken: Some(snapshot.elapsed_seconds()),
            status: Some(ATTEMPT_STATUS_COMPLETED.to_owned()),
            questions_data,
        })
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        AttemptId::new(self.id)
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Read access to the question table.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Fetch up to `limit` questions for a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend is unreachable or rows are malformed.
    async fn questions_for_course(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<Question>, StorageError>;

    /// Insert or replace a question by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;
}

/// Append-only log of finished attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Persist a finished attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the id already exists, or other storage errors.
    async fn append_attempt(&self, attempt: &AttemptRecord) -> Result<AttemptId, StorageError>;

    /// Most recent attempts for a course, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn recent_attempts(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<AttemptRecord>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
    attempts: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn questions_for_course(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|q| q.course_code() == course)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.iter_mut().find(|q| q.id() == question.id()) {
            Some(existing) => *existing = question.clone(),
            None => guard.push(question.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &AttemptRecord) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.iter().any(|a| a.id == attempt.id) {
            return Err(StorageError::Conflict);
        }
        guard.push(attempt.clone());
        Ok(attempt.attempt_id())
    }

    async fn recent_attempts(
        &self,
        course: &CourseCode,
        limit: usize,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<_> = guard
            .iter()
            .filter(|a| a.course_code == course.as_str())
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.completed_at
                .unwrap_or(b.started_at)
                .cmp(&a.completed_at.unwrap_or(a.started_at))
        });
        rows.truncate(limit);
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let attempts: Arc<dyn AttemptRepository> = Arc::new(repo);
        Self {
            questions,
            attempts,
        }
    }
}
