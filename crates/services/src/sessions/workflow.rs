use log::{info, warn};
use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{
    AttemptId, CourseCatalog, CourseCode, DEFAULT_POOL_LIMIT, DEFAULT_SESSION_SIZE, OptionLabel,
};
use storage::repository::{AttemptRecord, AttemptRepository, QuestionRepository, StorageError};

use super::phase::SessionPhase;
use super::sampler::QuestionSampler;
use super::tracker::{AdvanceOutcome, QuizSession};
use crate::error::SessionError;

/// Result of advancing through a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceResult {
    pub outcome: AdvanceOutcome,
    /// Set once a submitted attempt has been written to the attempt log.
    pub attempt_id: Option<AttemptId>,
}

/// Orchestrates course lookup, question fetch, sampling, and submission.
#[derive(Clone)]
pub struct QuizLoopService {
    clock: Clock,
    catalog: CourseCatalog,
    questions: Arc<dyn QuestionRepository>,
    attempts: Option<Arc<dyn AttemptRepository>>,
    sampler: QuestionSampler,
    pool_limit: usize,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(clock: Clock, questions: Arc<dyn QuestionRepository>) -> Self {
        Self {
            clock,
            catalog: CourseCatalog::builtin(),
            questions,
            attempts: None,
            sampler: QuestionSampler::new(DEFAULT_SESSION_SIZE),
            pool_limit: DEFAULT_POOL_LIMIT,
        }
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: CourseCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn with_session_size(mut self, session_size: usize) -> Self {
        self.sampler = QuestionSampler::new(session_size);
        self
    }

    #[must_use]
    pub fn with_pool_limit(mut self, pool_limit: usize) -> Self {
        self.pool_limit = pool_limit;
        self
    }

    /// Persist every submitted attempt to `attempts`.
    #[must_use]
    pub fn with_attempt_log(mut self, attempts: Arc<dyn AttemptRepository>) -> Self {
        self.attempts = Some(attempts);
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn session_size(&self) -> usize {
        self.sampler.target_size()
    }

    #[must_use]
    pub fn pool_limit(&self) -> usize {
        self.pool_limit
    }

    /// Start a new session for the given course.
    ///
    /// Fetches up to `pool_limit` questions, samples `session_size` of them, and
    /// hands the list to a fresh tracker.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownCourse` for codes outside the catalog,
    /// `SessionError::Fetch` if the question pool cannot be loaded (retryable),
    /// and `SessionError::NoContent` if the course has no questions.
    pub async fn start_session(&self, course_code: &CourseCode) -> Result<QuizSession, SessionError> {
        let course = self
            .catalog
            .get(course_code)
            .ok_or_else(|| SessionError::UnknownCourse(course_code.clone()))?;

        let pool = self
            .questions
            .questions_for_course(course_code, self.pool_limit)
            .await
            .map_err(|err| {
                warn!("question fetch for {course_code} failed: {err}");
                SessionError::Fetch(err)
            })?;
        let pool_len = pool.len();
        let sampled = self.sampler.sample(pool);

        let mut session = QuizSession::new(course, self.clock.now());
        if session.load(sampled)? == SessionPhase::NoContent {
            info!("course {course_code} has no questions");
            return Err(SessionError::NoContent);
        }

        info!(
            "started {course_code} session with {} of {pool_len} questions",
            session.questions().len()
        );
        Ok(session)
    }

    /// Stage a selection for the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn select(&self, session: &mut QuizSession, label: OptionLabel) -> Result<(), SessionError> {
        session.select_option(label)
    }

    /// Commit the current selection and move on, submitting after the last question.
    ///
    /// When attempt logging is enabled the submitted attempt is appended once.
    /// A failed append leaves the results in place; call
    /// [`finalize_attempt`](Self::finalize_attempt) to retry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for tracker failures. Attempt log failures are
    /// logged but not returned here.
    pub async fn advance(&self, session: &mut QuizSession) -> Result<AdvanceResult, SessionError> {
        let outcome = session.advance(self.clock.now())?;

        if let AdvanceOutcome::Submitted(snapshot) = &outcome {
            info!(
                "submitted {}: {}/{} ({}%) in {}s",
                snapshot.course_code(),
                snapshot.score(),
                snapshot.total(),
                snapshot.percentage(),
                snapshot.elapsed_seconds()
            );
            if self.attempts.is_some() {
                if let Err(err) = self.finalize_attempt(session).await {
                    warn!("attempt log append failed: {err}");
                }
            }
        }

        Ok(AdvanceResult {
            outcome,
            attempt_id: session.attempt_id(),
        })
    }

    /// Step back one question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn retreat(&self, session: &mut QuizSession) -> Result<usize, SessionError> {
        session.retreat()
    }

    /// Write a submitted session to the attempt log, at most once.
    ///
    /// The row id is the session's [`submission_id`](QuizSession::submission_id),
    /// so retrying after a lost reply cannot add a second row: a `Conflict` on
    /// that id means an earlier append already landed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AttemptLogDisabled` without a log configured,
    /// `SessionError::NotSubmitted` before results exist, and
    /// `SessionError::Storage` if the append fails.
    pub async fn finalize_attempt(&self, session: &mut QuizSession) -> Result<AttemptId, SessionError> {
        if let Some(id) = session.attempt_id() {
            return Ok(id);
        }
        let attempts = self
            .attempts
            .as_ref()
            .ok_or(SessionError::AttemptLogDisabled)?;
        let (Some(snapshot), Some(reserved)) = (session.results(), session.submission_id()) else {
            return Err(SessionError::NotSubmitted);
        };

        let record = AttemptRecord::from_snapshot(reserved, None, snapshot)?;
        let id = match attempts.append_attempt(&record).await {
            Ok(id) => id,
            Err(StorageError::Conflict) => {
                info!("attempt {reserved} was already recorded");
                reserved
            }
            Err(err) => return Err(err.into()),
        };
        session.set_attempt_id(id);
        info!("recorded attempt {id}");
        Ok(id)
    }
}
