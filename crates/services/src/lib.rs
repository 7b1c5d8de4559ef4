#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use config::{Backend, QuizConfig};
pub use error::{AppServicesError, ConfigError, SessionError};

pub use sessions::{
    AdvanceOutcome, AdvanceResult, AttemptHistoryService, AttemptListItem, QuestionSampler,
    QuizLoopService, QuizSession, SessionEvent, SessionPhase, SessionProgress,
};
