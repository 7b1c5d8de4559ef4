mod answer;
pub mod course;
mod ids;
mod question;
mod results;

pub use ids::{AttemptId, ParseIdError, QuestionId};

pub use answer::{AnswerRecord, AnswerSet};
pub use course::{Course, CourseCatalog, DEFAULT_POOL_LIMIT, DEFAULT_SESSION_SIZE};
pub use question::{
    CourseCode, OptionLabel, Question, QuestionError, UNCATEGORIZED_TOPIC, UNRATED_DIFFICULTY,
};
pub use results::{
    PerformanceRating, QuestionReview, ResultsSnapshot, ScoreBand, TopicPerformance,
};
