use std::sync::Arc;

use log::{debug, warn};
use quiz_core::model::{QuestionBank, QuizSettings, ResultRecord, ResultsHistory, SessionState};

use crate::records::{ProgressRecord, ResultRow};
use crate::repository::{KeyValueStore, StorageError, StoreKey};

/// Serializes session snapshots and the capped results history into a `KeyValueStore`.
///
/// Reads never fail on absent or malformed data; they fall back to empty values.
/// Only backend failures are reported as `StorageError`.
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    total_seconds: u32,
    history_capacity: usize,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, settings: &QuizSettings) -> Self {
        Self {
            store,
            total_seconds: settings.total_seconds(),
            history_capacity: settings.history_capacity(),
        }
    }

    /// Write the full snapshot under `"progress"`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the write fails.
    pub async fn save_progress(&self, state: &SessionState) -> Result<(), StorageError> {
        let record = ProgressRecord::from_session(state);
        let raw = serde_json::to_string(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.put(StoreKey::Progress, &raw).await?;
        debug!(
            "saved progress: {} questions, {} answers, {}s left",
            state.len(),
            state.answers().len(),
            state.remaining_seconds()
        );
        Ok(())
    }

    /// Load the saved snapshot, rebuilt against the current bank.
    ///
    /// Returns `Ok(None)` when nothing (or nothing readable) is stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend read fails.
    pub async fn load_progress(
        &self,
        bank: &QuestionBank,
    ) -> Result<Option<SessionState>, StorageError> {
        let Some(raw) = self.store.get(StoreKey::Progress).await? else {
            return Ok(None);
        };
        let record: ProgressRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(err) => {
                warn!("ignoring malformed progress snapshot: {err}");
                return Ok(None);
            }
        };

        let restored = record.into_session(bank, self.total_seconds);
        if !restored.dropped_ids.is_empty() {
            warn!(
                "dropped {} saved question(s) no longer in the bank: {:?}",
                restored.dropped_ids.len(),
                restored.dropped_ids
            );
        }
        if !restored.reordered_ids.is_empty() {
            warn!(
                "saved option order no longer matches for {:?}; using bank order",
                restored.reordered_ids
            );
        }
        Ok(Some(restored.state))
    }

    /// Read the results history, skipping entries that cannot be decoded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the backend read fails.
    pub async fn load_history(&self) -> Result<ResultsHistory, StorageError> {
        let raw = self.store.get(StoreKey::ResultsHistory).await?;
        Ok(ResultsHistory::from_records(
            self.history_capacity,
            decode_history(raw.as_deref()),
        ))
    }

    /// Append a record, keep the newest `history_capacity` entries, and write back.
    ///
    /// A record equal to the newest stored entry is not appended again.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read, encoding or write fails.
    pub async fn append_result(&self, record: &ResultRecord) -> Result<ResultsHistory, StorageError> {
        let mut history = self.load_history().await?;
        if history.latest() == Some(record) {
            debug!("result from {} already in history", record.timestamp);
            return Ok(history);
        }
        history.push(record.clone());

        let rows: Vec<ResultRow> = history.iter().map(ResultRow::from_record).collect();
        let raw =
            serde_json::to_string(&rows).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.put(StoreKey::ResultsHistory, &raw).await?;
        debug!("results history now holds {} entries", history.len());
        Ok(history)
    }
}

fn decode_history(raw: Option<&str>) -> Vec<ResultRecord> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let values: Vec<serde_json::Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(err) => {
            warn!("ignoring malformed results history: {err}");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ResultRow>(value) {
            Ok(row) => Some(row.into_record()),
            Err(err) => {
                warn!("skipping unreadable result entry: {err}");
                None
            }
        })
        .collect()
}
