use quiz_core::model::ResultRecord;
use storage::gateway::PersistenceGateway;

use crate::error::QuizError;

/// Read side of the results history.
#[derive(Clone)]
pub struct ResultsHistoryService {
    gateway: PersistenceGateway,
}

impl ResultsHistoryService {
    #[must_use]
    pub fn new(gateway: PersistenceGateway) -> Self {
        Self { gateway }
    }

    /// Stored results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the store cannot be read.
    pub async fn recent(&self) -> Result<Vec<ResultRecord>, QuizError> {
        let history = self.gateway.load_history().await?;
        Ok(history.iter().rev().cloned().collect())
    }

    /// Most recent result, if any.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the store cannot be read.
    pub async fn latest(&self) -> Result<Option<ResultRecord>, QuizError> {
        let history = self.gateway.load_history().await?;
        Ok(history.latest().cloned())
    }
}
