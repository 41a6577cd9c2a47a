use std::collections::BTreeMap;

use thiserror::Error;

use crate::model::result::ResultRecord;
use crate::model::selection::SelectionEntry;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("position {position} is outside the selection (len {len})")]
    InvalidPosition { position: usize, len: usize },

    #[error("session already submitted")]
    Submitted,
}

/// Lifecycle of one attempt. Moves forward only; a reset starts a fresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    InProgress,
    Submitted,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not_started",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Submitted => "submitted",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "not_started" => Some(SessionStatus::NotStarted),
            "in_progress" => Some(SessionStatus::InProgress),
            "submitted" => Some(SessionStatus::Submitted),
            _ => None,
        }
    }
}

/// What a single countdown step did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is already submitted; nothing changed.
    Ignored,
    /// Time was decremented and some remains.
    Running { remaining_seconds: u32 },
    /// The countdown is at zero; the session must be submitted now.
    Expired,
}

/// Mutable record of one attempt: selection, answers, time and status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    selected: Vec<SelectionEntry>,
    answers: BTreeMap<usize, String>,
    remaining_seconds: u32,
    total_seconds: u32,
    status: SessionStatus,
    result: Option<ResultRecord>,
    history_recorded: bool,
}

impl SessionState {
    /// A fresh, not yet started attempt over `selected`.
    #[must_use]
    pub fn new(selected: Vec<SelectionEntry>, total_seconds: u32) -> Self {
        Self {
            selected,
            answers: BTreeMap::new(),
            remaining_seconds: total_seconds,
            total_seconds,
            status: SessionStatus::NotStarted,
            result: None,
            history_recorded: false,
        }
    }

    /// Rehydrate a snapshot. Answers keyed outside the selection are discarded and
    /// the remaining time is clamped into `[0, total_seconds]`.
    #[must_use]
    pub fn from_persisted(
        selected: Vec<SelectionEntry>,
        answers: BTreeMap<usize, String>,
        remaining_seconds: u32,
        total_seconds: u32,
        status: SessionStatus,
        result: Option<ResultRecord>,
    ) -> Self {
        let len = selected.len();
        let answers = answers
            .into_iter()
            .filter(|(position, _)| *position < len)
            .collect();
        let result = if status == SessionStatus::Submitted {
            result
        } else {
            None
        };

        Self {
            selected,
            answers,
            remaining_seconds: remaining_seconds.min(total_seconds),
            total_seconds,
            status,
            result,
            history_recorded: false,
        }
    }

    /// Restore whether the finalized result already reached the results history.
    /// Ignored unless the snapshot carries a result.
    #[must_use]
    pub fn with_history_recorded(mut self, recorded: bool) -> Self {
        self.history_recorded = recorded && self.result.is_some();
        self
    }

    #[must_use]
    pub fn selected(&self) -> &[SelectionEntry] {
        &self.selected
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, String> {
        &self.answers
    }

    #[must_use]
    pub fn answer(&self, position: usize) -> Option<&str> {
        self.answers.get(&position).map(String::as_str)
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// Seconds used so far, within `[0, total_seconds]`.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.total_seconds.saturating_sub(self.remaining_seconds)
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status == SessionStatus::Submitted
    }

    /// The finalized result, present once submitted.
    #[must_use]
    pub fn result(&self) -> Option<&ResultRecord> {
        self.result.as_ref()
    }

    /// True once the finalized result has been appended to the results history.
    #[must_use]
    pub fn is_history_recorded(&self) -> bool {
        self.history_recorded
    }

    /// Note that the finalized result is now in the results history.
    pub fn mark_history_recorded(&mut self) {
        if self.result.is_some() {
            self.history_recorded = true;
        }
    }

    /// Number of positions in the selection without an answer.
    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        let len = self.selected.len();
        let answered = self.answers.keys().filter(|&&position| position < len).count();
        len - answered
    }

    /// Record (or overwrite) the answer for `position`.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::InvalidPosition` when `position` is outside the selection,
    /// or `AnswerError::Submitted` after submission. State is untouched on error.
    pub fn record_answer(
        &mut self,
        position: usize,
        value: impl Into<String>,
    ) -> Result<(), AnswerError> {
        if self.is_submitted() {
            return Err(AnswerError::Submitted);
        }
        if position >= self.selected.len() {
            return Err(AnswerError::InvalidPosition {
                position,
                len: self.selected.len(),
            });
        }

        self.answers.insert(position, value.into());
        self.start();
        Ok(())
    }

    /// Begin a fresh attempt over `selection` with the full time budget.
    pub fn reset(&mut self, selection: Vec<SelectionEntry>) {
        self.selected = selection;
        self.answers.clear();
        self.remaining_seconds = self.total_seconds;
        self.status = SessionStatus::InProgress;
        self.result = None;
        self.history_recorded = false;
    }

    /// Swap in a new selection mid-attempt. Answers are cleared; time and status are kept.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::Submitted` once the attempt is finalized.
    pub fn replace_selection(&mut self, selection: Vec<SelectionEntry>) -> Result<(), AnswerError> {
        if self.is_submitted() {
            return Err(AnswerError::Submitted);
        }
        self.selected = selection;
        self.answers.clear();
        Ok(())
    }

    /// Advance the countdown by one second, clamped at zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.is_submitted() {
            return TickOutcome::Ignored;
        }
        self.start();
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_seconds: self.remaining_seconds,
            }
        }
    }

    pub(crate) fn finalize(&mut self, record: ResultRecord) {
        self.status = SessionStatus::Submitted;
        self.result = Some(record);
    }

    fn start(&mut self) {
        if self.status == SessionStatus::NotStarted {
            self.status = SessionStatus::InProgress;
        }
    }
}
