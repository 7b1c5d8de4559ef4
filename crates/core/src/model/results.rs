use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::{CourseCode, OptionLabel};

//
// ─── BANDS ─────────────────────────────────────────────────────────────────────
//

/// Coarse colour band for a percentage: high (>= 80), medium (>= 60), low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

impl ScoreBand {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => ScoreBand::High,
            60..=79 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}

/// Headline verdict shown with the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceRating {
    Excellent,
    Great,
    Good,
    KeepPracticing,
    NeedsStudy,
}

impl PerformanceRating {
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => PerformanceRating::Excellent,
            80..=89 => PerformanceRating::Great,
            70..=79 => PerformanceRating::Good,
            60..=69 => PerformanceRating::KeepPracticing,
            _ => PerformanceRating::NeedsStudy,
        }
    }
}

//
// ─── PER-QUESTION REVIEW ───────────────────────────────────────────────────────
//

/// Question content joined with the user's answer, as shown in the review list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionReview {
    pub id: QuestionId,
    pub text: String,
    pub options: [String; 4],
    pub correct: OptionLabel,
    /// `None` when the question was never answered.
    pub user_answer: Option<OptionLabel>,
    pub is_correct: bool,
    pub topic: String,
    pub difficulty: String,
}

/// Correct/total counts for one literal topic string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicPerformance {
    pub topic: String,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

impl TopicPerformance {
    #[must_use]
    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_percentage(self.percentage)
    }
}

//
// ─── RESULTS SNAPSHOT ──────────────────────────────────────────────────────────
//

/// Immutable outcome of a finished session.
///
/// Built only by [`crate::scoring::aggregate`]; `questions` mirrors the session
/// list in order and `score` equals the number of entries flagged correct.
/// Serialize-only: a snapshot is never read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsSnapshot {
    course_code: CourseCode,
    course_name: String,
    score: u32,
    total: u32,
    percentage: u32,
    elapsed_seconds: u64,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    questions: Vec<QuestionReview>,
    topics: Vec<TopicPerformance>,
}

impl ResultsSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        course_code: CourseCode,
        course_name: String,
        score: u32,
        total: u32,
        percentage: u32,
        elapsed_seconds: u64,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        questions: Vec<QuestionReview>,
        topics: Vec<TopicPerformance>,
    ) -> Self {
        Self {
            course_code,
            course_name,
            score,
            total,
            percentage,
            elapsed_seconds,
            started_at,
            completed_at,
            questions,
            topics,
        }
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
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.total.saturating_sub(self.score)
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionReview] {
        &self.questions
    }

    /// Per-topic breakdown, in order of first appearance.
    #[must_use]
    pub fn topics(&self) -> &[TopicPerformance] {
        &self.topics
    }

    /// Elapsed time divided by question count, rounded half up.
    #[must_use]
    pub fn average_seconds_per_question(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        let total = u64::from(self.total);
        (2 * self.elapsed_seconds + total) / (2 * total)
    }

    #[must_use]
    pub fn score_band(&self) -> ScoreBand {
        ScoreBand::from_percentage(self.percentage)
    }

    #[must_use]
    pub fn rating(&self) -> PerformanceRating {
        PerformanceRating::from_percentage(self.percentage)
    }
}
