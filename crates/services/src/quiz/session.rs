use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use quiz_core::Clock;
use quiz_core::countdown::TimerReading;
use quiz_core::model::{
    QuestionBank, QuizSettings, ResultRecord, SelectionEntry, SessionState, SessionStatus,
    TickOutcome,
};
use quiz_core::scoring;
use storage::gateway::PersistenceGateway;

use super::review::{ReviewItem, review_items};
use super::sampler::Sampler;
use super::timer::{CountdownTimer, TimerTick};
use crate::error::QuizError;

//
// ─── TICK REPORT ───────────────────────────────────────────────────────────────
//

/// What one countdown step produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub reading: TimerReading,
    /// Set when this tick reached zero and submitted the session.
    pub auto_submitted: Option<ResultRecord>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Owns one quiz attempt: its state, its countdown and its persistence.
///
/// Every mutating call writes the new snapshot through the gateway before
/// returning. At most one countdown is live at a time; ticks from a cancelled
/// countdown are discarded by [`QuizSession::next_tick`].
pub struct QuizSession {
    state: SessionState,
    bank: Arc<QuestionBank>,
    sampler: Sampler,
    gateway: PersistenceGateway,
    settings: QuizSettings,
    clock: Clock,
    timer: Option<CountdownTimer>,
    timer_attached: bool,
    generation: u64,
    tick_tx: UnboundedSender<TimerTick>,
    tick_rx: UnboundedReceiver<TimerTick>,
}

impl QuizSession {
    /// Sample a fresh attempt from the bank and persist it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the initial snapshot cannot be written.
    pub async fn start(
        bank: Arc<QuestionBank>,
        gateway: PersistenceGateway,
        settings: QuizSettings,
        clock: Clock,
    ) -> Result<Self, QuizError> {
        let sampler = Sampler::from_settings(&settings);
        let state = SessionState::new(sampler.select(&bank), settings.total_seconds());
        info!(
            "starting quiz with {} of {} questions",
            state.len(),
            bank.len()
        );
        let session = Self::from_state(state, bank, gateway, settings, clock);
        session.persist().await?;
        Ok(session)
    }

    /// Resume the saved attempt, or start a fresh one when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the store cannot be read or written.
    pub async fn resume_or_start(
        bank: Arc<QuestionBank>,
        gateway: PersistenceGateway,
        settings: QuizSettings,
        clock: Clock,
    ) -> Result<Self, QuizError> {
        match gateway.load_progress(&bank).await? {
            Some(state) if !state.is_empty() || bank.is_empty() => {
                info!(
                    "resuming quiz: {} questions, {} answered, {}s left, {}",
                    state.len(),
                    state.answers().len(),
                    state.remaining_seconds(),
                    state.status().as_str()
                );
                Ok(Self::from_state(state, bank, gateway, settings, clock))
            }
            Some(_) => {
                info!("saved quiz has no questions left in the bank; starting over");
                Self::start(bank, gateway, settings, clock).await
            }
            None => Self::start(bank, gateway, settings, clock).await,
        }
    }

    fn from_state(
        state: SessionState,
        bank: Arc<QuestionBank>,
        gateway: PersistenceGateway,
        settings: QuizSettings,
        clock: Clock,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        Self {
            state,
            bank,
            sampler: Sampler::from_settings(&settings),
            gateway,
            settings,
            clock,
            timer: None,
            timer_attached: false,
            generation: 0,
            tick_tx,
            tick_rx,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn selected(&self) -> &[SelectionEntry] {
        self.state.selected()
    }

    #[must_use]
    pub fn answers(&self) -> &BTreeMap<usize, String> {
        self.state.answers()
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.state.status()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.state.unanswered_count()
    }

    #[must_use]
    pub fn result(&self) -> Option<&ResultRecord> {
        self.state.result()
    }

    #[must_use]
    pub fn reading(&self) -> TimerReading {
        TimerReading::for_session(&self.state, &self.settings)
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Per-question review of the attempt, in selection order.
    #[must_use]
    pub fn review(&self) -> Vec<ReviewItem> {
        review_items(&self.state)
    }

    /// Record the answer for `position`; the last write wins.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Answer` for an out-of-range position or a submitted
    /// session (state unchanged), or `QuizError::Storage` if the snapshot write fails.
    pub async fn record_answer(
        &mut self,
        position: usize,
        value: impl Into<String>,
    ) -> Result<(), QuizError> {
        self.state.record_answer(position, value)?;
        self.persist().await
    }

    /// Start a fresh attempt over `selection` with the full time budget.
    ///
    /// The running countdown is cancelled first; a new one is started if this
    /// session has a countdown attached.
    ///
    /// # Errors
    ///
    /// Returns `QuizError` if the snapshot write or the countdown restart fails.
    pub async fn reset(&mut self, selection: Vec<SelectionEntry>) -> Result<(), QuizError> {
        self.cancel_timer();
        self.state.reset(selection);
        info!("quiz reset with {} questions", self.state.len());
        self.persist().await?;
        if self.timer_attached {
            self.start_timer()?;
        }
        Ok(())
    }

    /// Retry the same questions in the same option order.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::reset`].
    pub async fn retry_same(&mut self) -> Result<(), QuizError> {
        let selection = self.state.selected().to_vec();
        self.reset(selection).await
    }

    /// Start over with a freshly sampled selection.
    ///
    /// # Errors
    ///
    /// See [`QuizSession::reset`].
    pub async fn new_test(&mut self) -> Result<(), QuizError> {
        let selection = self.sampler.select(&self.bank);
        self.reset(selection).await
    }

    /// Re-roll the questions mid-attempt. Answers are cleared; time keeps running.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Answer` after submission, or `QuizError::Storage` if
    /// the snapshot write fails.
    pub async fn shuffle_questions(&mut self) -> Result<(), QuizError> {
        let selection = self.sampler.select(&self.bank);
        self.state.replace_selection(selection)?;
        info!("questions reshuffled: {} drawn", self.state.len());
        self.persist().await
    }

    /// Attach a countdown, replacing any running one. Does nothing once submitted.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoRuntime` outside of a tokio runtime.
    pub fn start_timer(&mut self) -> Result<(), QuizError> {
        self.cancel_timer();
        self.timer_attached = true;
        if self.state.is_submitted() {
            return Ok(());
        }
        self.generation += 1;
        self.timer = Some(CountdownTimer::start(
            self.generation,
            self.settings.tick_period(),
            self.tick_tx.clone(),
        )?);
        debug!("countdown {} started", self.generation);
        Ok(())
    }

    /// Stop the running countdown, if any.
    pub fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!("countdown {} cancelled", timer.generation());
            timer.cancel();
        }
    }

    #[must_use]
    pub fn has_active_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Wait for the next tick of the live countdown.
    ///
    /// Returns `None` immediately when no countdown is running. Ticks left over
    /// from a cancelled countdown are skipped.
    pub async fn next_tick(&mut self) -> Option<TimerTick> {
        let live = self.timer.as_ref()?.generation();
        loop {
            let tick = self.tick_rx.recv().await?;
            if tick.generation == live {
                return Some(tick);
            }
        }
    }

    /// Advance the countdown by one step and persist; submits when time runs out.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if persistence fails.
    pub async fn tick(&mut self) -> Result<TickReport, QuizError> {
        let auto_submitted = match self.state.tick() {
            TickOutcome::Ignored => None,
            TickOutcome::Running { .. } => {
                self.persist().await?;
                None
            }
            TickOutcome::Expired => {
                info!("time is up; submitting automatically");
                Some(self.submit().await?)
            }
        };
        Ok(TickReport {
            reading: self.reading(),
            auto_submitted,
        })
    }

    /// Score and finalize the attempt, stop the countdown and append to history.
    ///
    /// Calling it again returns the same record and does not append twice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if persistence fails; a later call, also
    /// after a reload, retries the pending writes.
    pub async fn submit(&mut self) -> Result<ResultRecord, QuizError> {
        self.cancel_timer();
        let submission = scoring::submit(&mut self.state, self.clock.now());
        self.persist().await?;

        if !self.state.is_history_recorded() {
            self.gateway.append_result(&submission.record).await?;
            self.state.mark_history_recorded();
            self.persist().await?;
        }
        if submission.newly_submitted {
            info!(
                "quiz submitted: {}/{} correct ({}%) in {}s",
                submission.record.correct_count,
                submission.record.total_questions,
                submission.record.score_percent,
                submission.record.elapsed_seconds
            );
        }
        Ok(submission.record)
    }

    async fn persist(&self) -> Result<(), QuizError> {
        self.gateway.save_progress(&self.state).await?;
        Ok(())
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("selected_len", &self.state.len())
            .field("answered", &self.state.answers().len())
            .field("remaining_seconds", &self.state.remaining_seconds())
            .field("status", &self.state.status())
            .field("generation", &self.generation)
            .field("timer_active", &self.timer.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
