use chrono::{DateTime, Utc};
use log::debug;
use std::fmt;

use quiz_core::model::{
    AnswerRecord, AnswerSet, AttemptId, Course, CourseCode, OptionLabel, Question,
    ResultsSnapshot,
};
use quiz_core::scoring::{ScoringInput, aggregate, percentage_round_half_up};
use quiz_core::time::elapsed_seconds;

use super::phase::{SessionEvent, SessionPhase};
use super::progress::SessionProgress;
use crate::error::SessionError;

/// What happened on [`QuizSession::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Nothing is selected for the current question; the session is unchanged.
    SelectionRequired,
    /// The answer was committed and the session moved to `position`.
    Moved {
        position: usize,
        record: AnswerRecord,
    },
    /// The last answer was committed and the session was scored.
    Submitted(ResultsSnapshot),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's pass through a sampled question list.
///
/// Steps linearly through the questions, keeping at most one committed answer
/// per question. The selection staged for the current question is separate
/// from the committed answers until [`advance`](Self::advance) commits it.
pub struct QuizSession {
    course_code: CourseCode,
    course_name: String,
    phase: SessionPhase,
    questions: Vec<Question>,
    position: usize,
    staged: Option<OptionLabel>,
    answers: AnswerSet,
    started_at: DateTime<Utc>,
    results: Option<ResultsSnapshot>,
    submission_id: Option<AttemptId>,
    attempt_id: Option<AttemptId>,
}

impl QuizSession {
    /// Create a session in `Loading`, waiting for its question list.
    #[must_use]
    pub fn new(course: &Course, started_at: DateTime<Utc>) -> Self {
        Self {
            course_code: course.code().clone(),
            course_name: course.name().to_owned(),
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            position: 0,
            staged: None,
            answers: AnswerSet::new(),
            started_at,
            results: None,
            submission_id: None,
            attempt_id: None,
        }
    }

    fn fire(&mut self, event: SessionEvent) -> Result<SessionPhase, SessionError> {
        let next = self
            .phase
            .on(event)
            .ok_or(SessionError::InvalidTransition {
                phase: self.phase,
                event,
            })?;
        debug!("session {}: {:?} -> {next:?} on {event:?}", self.course_code, self.phase);
        self.phase = next;
        Ok(next)
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::InProgress {
            Ok(())
        } else {
            Err(SessionError::NotInProgress { phase: self.phase })
        }
    }

    /// Hand over the sampled list. An empty list ends the session in `NoContent`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is `Loading`.
    pub fn load(&mut self, questions: Vec<Question>) -> Result<SessionPhase, SessionError> {
        let event = if questions.is_empty() {
            SessionEvent::LoadedEmpty
        } else {
            SessionEvent::Loaded
        };
        let phase = self.fire(event)?;
        self.questions = questions;
        Ok(phase)
    }

    /// Stage `label` for the current question without moving.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn select_option(&mut self, label: OptionLabel) -> Result<(), SessionError> {
        self.ensure_in_progress()?;
        self.staged = Some(label);
        Ok(())
    }

    /// Commit the current selection and move forward, or submit on the last question.
    ///
    /// The staged selection wins over a previously committed one. When neither
    /// exists, returns [`AdvanceOutcome::SelectionRequired`] and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`, or
    /// `SessionError::Scoring` if aggregation fails (the session then stays in
    /// progress on the last question).
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<AdvanceOutcome, SessionError> {
        self.ensure_in_progress()?;
        let Some(question) = self.questions.get(self.position) else {
            return Err(SessionError::NotInProgress { phase: self.phase });
        };
        let Some(selected) = self.staged.or_else(|| self.recorded_selection()) else {
            return Ok(AdvanceOutcome::SelectionRequired);
        };

        let record = AnswerRecord::grade(question, selected);
        self.answers.upsert(record);

        if self.is_last() {
            let snapshot = self.submit(now)?;
            return Ok(AdvanceOutcome::Submitted(snapshot));
        }

        self.position += 1;
        self.staged = self.recorded_selection();
        Ok(AdvanceOutcome::Moved {
            position: self.position,
            record,
        })
    }

    /// Step back one question, restoring its committed selection. No-op at the start.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` outside `InProgress`.
    pub fn retreat(&mut self) -> Result<usize, SessionError> {
        self.ensure_in_progress()?;
        if self.position > 0 {
            self.position -= 1;
            self.staged = self.recorded_selection();
        }
        Ok(self.position)
    }

    fn submit(&mut self, now: DateTime<Utc>) -> Result<ResultsSnapshot, SessionError> {
        self.fire(SessionEvent::SubmitRequested)?;

        let scored = aggregate(ScoringInput {
            course_code: &self.course_code,
            course_name: &self.course_name,
            questions: &self.questions,
            answers: &self.answers,
            elapsed_seconds: elapsed_seconds(self.started_at, now),
            started_at: self.started_at,
            completed_at: now,
        });

        match scored {
            Ok(snapshot) => {
                self.fire(SessionEvent::Aggregated)?;
                self.staged = None;
                self.results = Some(snapshot.clone());
                self.submission_id = Some(AttemptId::generate());
                Ok(snapshot)
            }
            Err(err) => {
                self.fire(SessionEvent::AggregationFailed)?;
                Err(err.into())
            }
        }
    }

    fn recorded_selection(&self) -> Option<OptionLabel> {
        let question = self.questions.get(self.position)?;
        self.answers.get(question.id()).map(|r| r.selected)
    }

    #[must_use]
    pub fn course_code(&self) -> &CourseCode {
        &self.course_code
    }

    #[must_use]
    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase == SessionPhase::InProgress {
            self.questions.get(self.position)
        } else {
            None
        }
    }

    /// Selection that `advance` would commit right now.
    #[must_use]
    pub fn staged_selection(&self) -> Option<OptionLabel> {
        self.staged
    }

    /// Committed answer for the current question, if any.
    #[must_use]
    pub fn recorded_answer(&self) -> Option<&AnswerRecord> {
        let question = self.questions.get(self.position)?;
        self.answers.get(question.id())
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.questions.is_empty() && self.position + 1 == self.questions.len()
    }

    #[must_use]
    pub fn can_advance(&self) -> bool {
        self.phase == SessionPhase::InProgress
            && (self.staged.is_some() || self.recorded_answer().is_some())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let through = u32::try_from(self.position + 1).unwrap_or(u32::MAX);
        let whole = u32::try_from(total).unwrap_or(u32::MAX);
        SessionProgress {
            position: self.position,
            total,
            answered: self.answers.len(),
            percent_through: percentage_round_half_up(through, whole).unwrap_or(0),
            is_last: self.is_last(),
        }
    }

    /// Seconds since the session started, for the running timer.
    #[must_use]
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        elapsed_seconds(self.started_at, now)
    }

    #[must_use]
    pub fn results(&self) -> Option<&ResultsSnapshot> {
        self.results.as_ref()
    }

    /// Row id reserved for this session's attempt log entry, fixed at submission.
    ///
    /// Every append of this session reuses it, so a retried write after a lost
    /// reply collides with the stored row instead of adding a second one.
    #[must_use]
    pub fn submission_id(&self) -> Option<AttemptId> {
        self.submission_id
    }

    /// Id of the attempt log entry once an append has been confirmed.
    #[must_use]
    pub fn attempt_id(&self) -> Option<AttemptId> {
        self.attempt_id
    }

    pub(crate) fn set_attempt_id(&mut self, id: AttemptId) {
        self.attempt_id = Some(id);
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("course_code", &self.course_code)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("position", &self.position)
            .field("staged", &self.staged)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .field("submission_id", &self.submission_id)
            .field("attempt_id", &self.attempt_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
