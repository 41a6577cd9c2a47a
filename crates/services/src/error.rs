use thiserror::Error;

use quiz_core::model::{AnswerError, SettingsError};
use storage::bank::BankError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the quiz session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("no async runtime available to drive the countdown")]
    NoRuntime,
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}
