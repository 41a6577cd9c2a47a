use std::time::Duration;

use thiserror::Error;

/// Number of questions drawn per session.
pub const DEFAULT_SAMPLE_SIZE: usize = 50;
/// Length of one attempt.
pub const DEFAULT_TOTAL_SECONDS: u32 = 60 * 60;
/// Number of result records kept in history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;
/// The low-time warning shows while fewer whole minutes than this remain.
pub const DEFAULT_WARNING_MINUTES: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("sample size must be > 0")]
    InvalidSampleSize,

    #[error("total seconds must be > 0")]
    InvalidTotalSeconds,

    #[error("history capacity must be > 0")]
    InvalidHistoryCapacity,

    #[error("tick period must be non-zero")]
    InvalidTickPeriod,
}

/// Quiz-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    sample_size: usize,
    total_seconds: u32,
    history_capacity: usize,
    warning_minutes: u32,
    tick_period: Duration,
}

/// Unvalidated settings; `None` fields take the defaults.
#[derive(Debug, Clone, Default)]
pub struct QuizSettingsDraft {
    pub sample_size: Option<usize>,
    pub total_seconds: Option<u32>,
    pub history_capacity: Option<usize>,
    pub warning_minutes: Option<u32>,
    pub tick_period: Option<Duration>,
}

impl QuizSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft into settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` for zero sizes or a zero tick period.
    pub fn validate(self) -> Result<QuizSettings, SettingsError> {
        let sample_size = self.sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE);
        if sample_size == 0 {
            return Err(SettingsError::InvalidSampleSize);
        }
        let total_seconds = self.total_seconds.unwrap_or(DEFAULT_TOTAL_SECONDS);
        if total_seconds == 0 {
            return Err(SettingsError::InvalidTotalSeconds);
        }
        let history_capacity = self.history_capacity.unwrap_or(DEFAULT_HISTORY_CAPACITY);
        if history_capacity == 0 {
            return Err(SettingsError::InvalidHistoryCapacity);
        }
        let tick_period = self.tick_period.unwrap_or(Duration::from_secs(1));
        if tick_period.is_zero() {
            return Err(SettingsError::InvalidTickPeriod);
        }

        Ok(QuizSettings {
            sample_size,
            total_seconds,
            history_capacity,
            warning_minutes: self.warning_minutes.unwrap_or(DEFAULT_WARNING_MINUTES),
            tick_period,
        })
    }
}

impl QuizSettings {
    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    #[must_use]
    pub fn warning_minutes(&self) -> u32 {
        self.warning_minutes
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            total_seconds: DEFAULT_TOTAL_SECONDS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            warning_minutes: DEFAULT_WARNING_MINUTES,
            tick_period: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_yields_defaults() {
        let settings = QuizSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, QuizSettings::default());
        assert_eq!(settings.sample_size(), 50);
        assert_eq!(settings.total_seconds(), 3600);
        assert_eq!(settings.history_capacity(), 10);
    }

    #[test]
    fn zero_values_are_rejected() {
        let draft = QuizSettingsDraft {
            sample_size: Some(0),
            ..QuizSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::InvalidSampleSize);

        let draft = QuizSettingsDraft {
            tick_period: Some(Duration::ZERO),
            ..QuizSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::InvalidTickPeriod);
    }
}
