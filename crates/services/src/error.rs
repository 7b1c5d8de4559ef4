//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::CourseCode;
use quiz_core::scoring::ScoringError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::sessions::{SessionEvent, SessionPhase};

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown course: {0}")]
    UnknownCourse(CourseCode),
    #[error("no questions available for this course")]
    NoContent,
    #[error("failed to load questions: {0}")]
    Fetch(#[source] StorageError),
    #[error("session is {phase:?}, not in progress")]
    NotInProgress { phase: SessionPhase },
    #[error("{event:?} is not valid while {phase:?}")]
    InvalidTransition {
        phase: SessionPhase,
        event: SessionEvent,
    },
    #[error("session has no results yet")]
    NotSubmitted,
    #[error("attempt logging is not configured")]
    AttemptLogDisabled,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Whether the user should be offered a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Fetch(_) => true,
            SessionError::Storage(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("{var} must be a boolean flag, got {raw:?}")]
    InvalidFlag { var: &'static str, raw: String },
    #[error("{var} is required when {requires} is set")]
    Missing {
        var: &'static str,
        requires: &'static str,
    },
    #[error("pool limit ({pool_limit}) must be at least the session size ({session_size})")]
    PoolSmallerThanSession {
        pool_limit: usize,
        session_size: usize,
    },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
