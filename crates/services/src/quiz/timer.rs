use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::error::QuizError;

/// One countdown step, tagged with the timer that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick {
    pub generation: u64,
}

/// Handle to a running countdown task.
///
/// The task sends a [`TimerTick`] every `period`, the first one a full period
/// after start. Cancelling or dropping the handle aborts the task.
#[derive(Debug)]
pub struct CountdownTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Spawn the countdown on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoRuntime` outside of a tokio runtime.
    pub fn start(
        generation: u64,
        period: Duration,
        ticks: UnboundedSender<TimerTick>,
    ) -> Result<Self, QuizError> {
        let handle = Handle::try_current().map_err(|_| QuizError::NoRuntime)?;
        let task = handle.spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if ticks.send(TimerTick { generation }).is_err() {
                    break;
                }
            }
        });
        Ok(Self { generation, task })
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the countdown. No tick is sent after this returns.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = CountdownTimer::start(3, Duration::from_secs(1), tx).unwrap();

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(TimerTick { generation: 3 }));
        }

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        // The only sender lived in the aborted task, so the channel drains and closes.
        let mut leftover = 0;
        while rx.recv().await.is_some() {
            leftover += 1;
        }
        assert!(leftover <= 1);
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let err = CountdownTimer::start(1, Duration::from_secs(1), tx).unwrap_err();
        assert!(matches!(err, QuizError::NoRuntime));
    }
}
