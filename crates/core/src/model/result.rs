use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Outcome of one submitted attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub score_percent: u8,
    pub correct_count: u32,
    pub total_questions: u32,
    pub elapsed_seconds: u32,
    pub timestamp: DateTime<Utc>,
}

/// Most recent results, oldest first, never longer than its capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsHistory {
    capacity: usize,
    entries: VecDeque<ResultRecord>,
}

impl ResultsHistory {
    /// An empty history holding at most `capacity` records (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Rebuild from stored records, keeping only the newest `capacity` of them.
    #[must_use]
    pub fn from_records(capacity: usize, records: impl IntoIterator<Item = ResultRecord>) -> Self {
        let mut history = Self::new(capacity);
        for record in records {
            history.push(record);
        }
        history
    }

    /// Append a record, dropping the oldest one when full.
    pub fn push(&mut self, record: ResultRecord) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn latest(&self) -> Option<&ResultRecord> {
        self.entries.back()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ResultRecord> {
        self.entries.iter()
    }
}
