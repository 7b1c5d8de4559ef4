use log::info;
use std::sync::Arc;

use quiz_core::model::CourseCatalog;
use storage::repository::Storage;

use crate::Clock;
use crate::config::{Backend, QuizConfig};
use crate::error::AppServicesError;
use crate::sessions::{AttemptHistoryService, QuizLoopService};

/// Assembles app-facing services over the configured backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: CourseCatalog,
    session_loop: Arc<QuizLoopService>,
    history: Arc<AttemptHistoryService>,
}

impl AppServices {
    /// Build services from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if configuration is invalid or storage initialization fails.
    pub async fn from_env(clock: Clock) -> Result<Self, AppServicesError> {
        let config = QuizConfig::from_env()?;
        Self::from_config(&config, clock).await
    }

    /// Build services over the backend named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn from_config(config: &QuizConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = match &config.backend {
            Backend::Rest(rest) => {
                info!("using hosted backend at {}", rest.base_url);
                Storage::rest(rest.clone())?
            }
            Backend::Sqlite(url) => {
                info!("using sqlite backend at {url}");
                Storage::sqlite(url).await?
            }
            Backend::InMemory => {
                info!("using in-memory backend");
                Storage::in_memory()
            }
        };
        Ok(Self::with_storage(storage, config, clock))
    }

    /// Build services over already-constructed storage.
    #[must_use]
    pub fn with_storage(storage: Storage, config: &QuizConfig, clock: Clock) -> Self {
        let catalog = CourseCatalog::builtin();

        let mut session_loop = QuizLoopService::new(clock, Arc::clone(&storage.questions))
            .with_catalog(catalog.clone())
            .with_session_size(config.session_size)
            .with_pool_limit(config.pool_limit);
        if config.record_attempts {
            session_loop = session_loop.with_attempt_log(Arc::clone(&storage.attempts));
        }
        let history = AttemptHistoryService::new(Arc::clone(&storage.attempts));

        Self {
            catalog,
            session_loop: Arc::new(session_loop),
            history: Arc::new(history),
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn session_loop(&self) -> Arc<QuizLoopService> {
        Arc::clone(&self.session_loop)
    }

    #[must_use]
    pub fn history(&self) -> Arc<AttemptHistoryService> {
        Arc::clone(&self.history)
    }
}
