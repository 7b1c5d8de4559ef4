use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::ids::QuestionId;
use crate::model::question::{OptionLabel, Question};

/// The committed selection for one question within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub selected: OptionLabel,
    pub is_correct: bool,
}

impl AnswerRecord {
    /// Grades `selected` against the question's correct option.
    #[must_use]
    pub fn grade(question: &Question, selected: OptionLabel) -> Self {
        Self {
            question_id: question.id(),
            selected,
            is_correct: question.is_correct(selected),
        }
    }
}

/// Answer records keyed by question id. At most one record per question;
/// a later commit replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    records: HashMap<QuestionId, AnswerRecord>,
}

impl AnswerSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for its question, returning the previous one.
    pub fn upsert(&mut self, record: AnswerRecord) -> Option<AnswerRecord> {
        self.records.insert(record.question_id, record)
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&AnswerRecord> {
        self.records.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records flagged correct.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.records.values().filter(|r| r.is_correct).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnswerRecord> {
        self.records.values()
    }
}

impl FromIterator<AnswerRecord> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = AnswerRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.upsert(record);
        }
        set
    }
}
