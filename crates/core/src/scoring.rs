//! Score aggregation for finished sessions.
//!
//! Everything here is a pure function of its inputs: the same session list,
//! answer set and timing always produce the same [`ResultsSnapshot`].

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    AnswerSet, CourseCode, Question, QuestionReview, ResultsSnapshot, TopicPerformance,
};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoringError {
    #[error("cannot score a session without questions")]
    EmptySession,

    #[error("too many questions for a single session: {len}")]
    TooManyQuestions { len: usize },
}

//
// ─── INPUT ─────────────────────────────────────────────────────────────────────
//

/// Everything the aggregator needs from a finished session.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub course_code: &'a CourseCode,
    pub course_name: &'a str,
    /// Session list in presentation order.
    pub questions: &'a [Question],
    pub answers: &'a AnswerSet,
    pub elapsed_seconds: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

//
// ─── ROUNDING ──────────────────────────────────────────────────────────────────
//

/// `round(100 * part / whole)` with halves rounded up, in integer arithmetic.
///
/// # Errors
///
/// Returns `ScoringError::EmptySession` when `whole` is zero.
pub fn percentage_round_half_up(part: u32, whole: u32) -> Result<u32, ScoringError> {
    if whole == 0 {
        return Err(ScoringError::EmptySession);
    }
    let part = u64::from(part);
    let whole = u64::from(whole);
    let rounded = (200 * part + whole) / (2 * whole);
    // part <= whole in every caller, so this fits; saturate otherwise.
    Ok(u32::try_from(rounded).unwrap_or(u32::MAX))
}

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

/// Builds the results snapshot for a finished session.
///
/// Unanswered questions stay in the breakdown with no user answer and count as
/// wrong. Topics are grouped by their literal string (no case or whitespace
/// folding) and listed in order of first appearance.
///
/// # Errors
///
/// Returns `ScoringError::EmptySession` if the session list is empty and
/// `ScoringError::TooManyQuestions` if its length does not fit in `u32`.
pub fn aggregate(input: ScoringInput<'_>) -> Result<ResultsSnapshot, ScoringError> {
    if input.questions.is_empty() {
        return Err(ScoringError::EmptySession);
    }
    let total = u32::try_from(input.questions.len()).map_err(|_| {
        ScoringError::TooManyQuestions {
            len: input.questions.len(),
        }
    })?;

    let reviews: Vec<QuestionReview> = input
        .questions
        .iter()
        .map(|question| {
            let record = input.answers.get(question.id());
            QuestionReview {
                id: question.id(),
                text: question.text().to_owned(),
                options: question.options().clone(),
                correct: question.correct(),
                user_answer: record.map(|r| r.selected),
                is_correct: record.is_some_and(|r| r.is_correct),
                topic: question.topic().to_owned(),
                difficulty: question.difficulty().to_owned(),
            }
        })
        .collect();

    let mut score = 0_u32;
    let mut groups: Vec<(String, u32, u32)> = Vec::new();
    for review in &reviews {
        let hit = u32::from(review.is_correct);
        score += hit;
        match groups.iter_mut().find(|(topic, _, _)| *topic == review.topic) {
            Some((_, correct, count)) => {
                *correct += hit;
                *count += 1;
            }
            None => groups.push((review.topic.clone(), hit, 1)),
        }
    }

    let topics = groups
        .into_iter()
        .map(|(topic, correct, count)| {
            Ok(TopicPerformance {
                topic,
                correct,
                total: count,
                percentage: percentage_round_half_up(correct, count)?,
            })
        })
        .collect::<Result<Vec<_>, ScoringError>>()?;

    let percentage = percentage_round_half_up(score, total)?;

    Ok(ResultsSnapshot::new(
        input.course_code.clone(),
        input.course_name.to_owned(),
        score,
        total,
        percentage,
        input.elapsed_seconds,
        input.started_at,
        input.completed_at,
        reviews,
        topics,
    ))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
