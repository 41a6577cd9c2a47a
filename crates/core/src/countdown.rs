//! Derived countdown values for display: minutes/seconds split, completion
//! fraction, low-time warning and urgency band.

use crate::model::{QuizSettings, SessionState};

/// How close the countdown is to running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUrgency {
    /// At least half of the time is left.
    Calm,
    /// Less than half is left.
    Low,
    /// Less than a fifth is left.
    Critical,
}

/// Snapshot of the countdown, recomputed after every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerReading {
    pub remaining_seconds: u32,
    pub minutes: u32,
    pub seconds: u32,
    /// `remaining / total`, in `[0, 1]`.
    pub fraction_remaining: f64,
    /// True while `0 < minutes < warning_minutes`.
    pub warning: bool,
    pub urgency: TimeUrgency,
}

impl TimerReading {
    #[must_use]
    pub fn new(remaining_seconds: u32, total_seconds: u32, warning_minutes: u32) -> Self {
        let remaining_seconds = remaining_seconds.min(total_seconds);
        let minutes = remaining_seconds / 60;
        let seconds = remaining_seconds % 60;
        let fraction_remaining = if total_seconds == 0 {
            0.0
        } else {
            f64::from(remaining_seconds) / f64::from(total_seconds)
        };
        let urgency = if fraction_remaining < 0.2 {
            TimeUrgency::Critical
        } else if fraction_remaining < 0.5 {
            TimeUrgency::Low
        } else {
            TimeUrgency::Calm
        };

        Self {
            remaining_seconds,
            minutes,
            seconds,
            fraction_remaining,
            warning: minutes > 0 && minutes < warning_minutes,
            urgency,
        }
    }

    #[must_use]
    pub fn for_session(state: &SessionState, settings: &QuizSettings) -> Self {
        Self::new(
            state.remaining_seconds(),
            state.total_seconds(),
            settings.warning_minutes(),
        )
    }

    /// `MM:SS`, zero padded.
    #[must_use]
    pub fn clock_face(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_time_is_calm_without_warning() {
        let reading = TimerReading::new(3600, 3600, 10);
        assert_eq!(reading.minutes, 60);
        assert_eq!(reading.seconds, 0);
        assert!((reading.fraction_remaining - 1.0).abs() < f64::EPSILON);
        assert!(!reading.warning);
        assert_eq!(reading.urgency, TimeUrgency::Calm);
        assert_eq!(reading.clock_face(), "60:00");
    }

    #[test]
    fn warning_is_strictly_between_zero_and_ten_minutes() {
        assert!(!TimerReading::new(600, 3600, 10).warning);
        assert!(TimerReading::new(599, 3600, 10).warning);
        assert!(TimerReading::new(60, 3600, 10).warning);
        assert!(!TimerReading::new(59, 3600, 10).warning);
    }

    #[test]
    fn urgency_bands_follow_fraction() {
        assert_eq!(TimerReading::new(1700, 3600, 10).urgency, TimeUrgency::Low);
        assert_eq!(TimerReading::new(700, 3600, 10).urgency, TimeUrgency::Critical);
        assert_eq!(TimerReading::new(65, 3600, 10).clock_face(), "01:05");
    }
}
