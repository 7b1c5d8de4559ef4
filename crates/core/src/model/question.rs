use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Topic assigned to questions stored without one.
pub const UNCATEGORIZED_TOPIC: &str = "Uncategorized";

/// Difficulty assigned to questions stored without one.
pub const UNRATED_DIFFICULTY: &str = "unrated";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("course code cannot be empty")]
    EmptyCourseCode,

    #[error("question text cannot be empty")]
    EmptyText,

    #[error("invalid option label: {0:?}")]
    InvalidLabel(String),
}

//
// ─── COURSE CODE ───────────────────────────────────────────────────────────────
//

/// Identifier of a course, e.g. `IFT212.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode(String);

impl CourseCode {
    /// Creates a course code from a raw string.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyCourseCode` if the trimmed value is empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, QuestionError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyCourseCode);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CourseCode {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CourseCode {
    type Error = QuestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourseCode> for String {
    fn from(value: CourseCode) -> Self {
        value.0
    }
}

//
// ─── OPTION LABEL ──────────────────────────────────────────────────────────────
//

/// One of the four answer slots of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels in display order.
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels are case-sensitive; `"b"` is not a valid label.
impl FromStr for OptionLabel {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(QuestionError::InvalidLabel(other.to_owned())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A four-option multiple-choice question belonging to one course.
///
/// Only built through [`Question::new`]; storage rows go through
/// `QuestionRecord` and the same validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    course_code: CourseCode,
    text: String,
    options: [String; 4],
    correct: OptionLabel,
    topic: String,
    difficulty: String,
}

impl Question {
    /// Builds a question, filling in defaults for a missing topic or difficulty.
    ///
    /// The topic is kept verbatim otherwise; grouping downstream relies on the
    /// literal string.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyText` if the question text is blank.
    pub fn new(
        id: QuestionId,
        course_code: CourseCode,
        text: impl Into<String>,
        options: [String; 4],
        correct: OptionLabel,
        topic: Option<String>,
        difficulty: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }

        Ok(Self {
            id,
            course_code,
            text,
            options,
            correct,
            topic: topic.unwrap_or_else(|| UNCATEGORIZED_TOPIC.to_owned()),
            difficulty: difficulty.unwrap_or_else(|| UNRATED_DIFFICULTY.to_owned()),
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn course_code(&self) -> &CourseCode {
        &self.course_code
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String; 4] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, label: OptionLabel) -> &str {
        &self.options[label.index()]
    }

    #[must_use]
    pub fn correct(&self) -> OptionLabel {
        self.correct
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    #[must_use]
    pub fn is_correct(&self, selected: OptionLabel) -> bool {
        selected == self.correct
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; 4] {
        ["one".into(), "two".into(), "three".into(), "four".into()]
    }

    #[test]
    fn label_parsing_is_case_sensitive() {
        assert_eq!(" C ".parse::<OptionLabel>().unwrap(), OptionLabel::C);
        let err = "c".parse::<OptionLabel>().unwrap_err();
        assert_eq!(err, QuestionError::InvalidLabel("c".into()));
        assert!("".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn course_code_is_trimmed_and_required() {
        assert_eq!(CourseCode::new(" IFT212.2 ").unwrap().as_str(), "IFT212.2");
        assert_eq!(CourseCode::new("  ").unwrap_err(), QuestionError::EmptyCourseCode);
    }

    #[test]
    fn question_requires_text() {
        let err = Question::new(
            QuestionId::generate(),
            CourseCode::new("IFT212.2").unwrap(),
            "   ",
            options(),
            OptionLabel::A,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn missing_topic_and_difficulty_get_defaults() {
        let q = Question::new(
            QuestionId::generate(),
            CourseCode::new("IFT212.2").unwrap(),
            "What does a D flip-flop store?",
            options(),
            OptionLabel::B,
            None,
            None,
        )
        .unwrap();
        assert_eq!(q.topic(), UNCATEGORIZED_TOPIC);
        assert_eq!(q.difficulty(), UNRATED_DIFFICULTY);
        assert_eq!(q.option(OptionLabel::B), "two");
        assert!(q.is_correct(OptionLabel::B));
        assert!(!q.is_correct(OptionLabel::A));
    }

    #[test]
    fn topic_is_kept_verbatim() {
        let q = Question::new(
            QuestionId::generate(),
            CourseCode::new("IFT235.2").unwrap(),
            "Which KPI tracks cold start?",
            options(),
            OptionLabel::D,
            Some(" networking ".into()),
            Some("medium".into()),
        )
        .unwrap();
        assert_eq!(q.topic(), " networking ");
    }
}
