use std::sync::Arc;

use quiz_core::model::{QuestionBank, QuizSettings};
use storage::gateway::PersistenceGateway;
use storage::repository::Storage;

use crate::Clock;
use crate::error::QuizServicesError;
use crate::quiz::{QuizSession, ResultsHistoryService};

/// Assembles the quiz services over one store and one question bank.
#[derive(Clone)]
pub struct QuizServices {
    settings: QuizSettings,
    clock: Clock,
    bank: Arc<QuestionBank>,
    gateway: PersistenceGateway,
    history: Arc<ResultsHistoryService>,
}

impl QuizServices {
    #[must_use]
    pub fn new(storage: &Storage, bank: QuestionBank, settings: QuizSettings, clock: Clock) -> Self {
        let gateway = PersistenceGateway::new(Arc::clone(&storage.store), &settings);
        let history = Arc::new(ResultsHistoryService::new(gateway.clone()));
        Self {
            settings,
            clock,
            bank: Arc::new(bank),
            gateway,
            history,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        bank: QuestionBank,
        settings: QuizSettings,
        clock: Clock,
    ) -> Result<Self, QuizServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, bank, settings, clock))
    }

    #[must_use]
    pub fn in_memory(bank: QuestionBank, settings: QuizSettings, clock: Clock) -> Self {
        Self::new(&Storage::in_memory(), bank, settings, clock)
    }

    /// Resume the stored attempt or start a new one.
    ///
    /// # Errors
    ///
    /// Returns `QuizServicesError::Quiz` if the store cannot be read or written.
    pub async fn open_session(&self) -> Result<QuizSession, QuizServicesError> {
        let session = QuizSession::resume_or_start(
            Arc::clone(&self.bank),
            self.gateway.clone(),
            self.settings.clone(),
            self.clock,
        )
        .await?;
        Ok(session)
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn bank(&self) -> Arc<QuestionBank> {
        Arc::clone(&self.bank)
    }

    #[must_use]
    pub fn history(&self) -> Arc<ResultsHistoryService> {
        Arc::clone(&self.history)
    }
}
