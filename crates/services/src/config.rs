use std::env;

use quiz_core::model::{DEFAULT_POOL_LIMIT, DEFAULT_SESSION_SIZE};
use storage::rest::RestConfig;

use crate::error::ConfigError;

pub const BACKEND_URL_VAR: &str = "QUIZ_BACKEND_URL";
pub const BACKEND_KEY_VAR: &str = "QUIZ_BACKEND_KEY";
pub const DB_URL_VAR: &str = "QUIZ_DB_URL";
pub const SESSION_SIZE_VAR: &str = "QUIZ_SESSION_SIZE";
pub const POOL_LIMIT_VAR: &str = "QUIZ_POOL_LIMIT";
pub const RECORD_ATTEMPTS_VAR: &str = "QUIZ_RECORD_ATTEMPTS";

/// Where questions and attempts live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Hosted table service.
    Rest(RestConfig),
    /// Local `SQLite` database URL.
    Sqlite(String),
    InMemory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizConfig {
    pub backend: Backend,
    pub session_size: usize,
    pub pool_limit: usize,
    pub record_attempts: bool,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            backend: Backend::InMemory,
            session_size: DEFAULT_SESSION_SIZE,
            pool_limit: DEFAULT_POOL_LIMIT,
            record_attempts: false,
        }
    }
}

impl QuizConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed values or a half-configured REST backend.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    ///
    /// The REST backend wins when `QUIZ_BACKEND_URL` is set, then `QUIZ_DB_URL`,
    /// then the in-memory backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed values or a half-configured REST backend.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|raw| raw.trim().to_owned())
                .filter(|raw| !raw.is_empty())
        };

        let backend = match (get(BACKEND_URL_VAR), get(DB_URL_VAR)) {
            (Some(base_url), _) => {
                let api_key = get(BACKEND_KEY_VAR).ok_or(ConfigError::Missing {
                    var: BACKEND_KEY_VAR,
                    requires: BACKEND_URL_VAR,
                })?;
                Backend::Rest(RestConfig::new(base_url, api_key))
            }
            (None, Some(db_url)) => Backend::Sqlite(db_url),
            (None, None) => Backend::InMemory,
        };

        let session_size =
            parse_count(SESSION_SIZE_VAR, get(SESSION_SIZE_VAR))?.unwrap_or(DEFAULT_SESSION_SIZE);
        let pool_limit =
            parse_count(POOL_LIMIT_VAR, get(POOL_LIMIT_VAR))?.unwrap_or(DEFAULT_POOL_LIMIT);
        if pool_limit < session_size {
            return Err(ConfigError::PoolSmallerThanSession {
                pool_limit,
                session_size,
            });
        }
        let record_attempts =
            parse_flag(RECORD_ATTEMPTS_VAR, get(RECORD_ATTEMPTS_VAR))?.unwrap_or(false);

        Ok(Self {
            backend,
            session_size,
            pool_limit,
            record_attempts,
        })
    }
}

fn parse_count(var: &'static str, raw: Option<String>) -> Result<Option<usize>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { var, raw }),
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidFlag { var, raw }),
    }
}
