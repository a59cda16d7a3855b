//! Timer-driven progress tracker.
//!
//! The tracker advances a [`StepBoard`] on a fixed cadence while a deployment
//! is outstanding and is reconciled with the real outcome when it ends.
//! Subscribers observe the board through a `watch` channel.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::config::ProgressSettings;

use super::steps::{DeploymentStage, StepBoard};

/// Outcome applied when tracking ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerOutcome {
    /// The deployment succeeded.
    Success,
    /// The deployment failed, at the given stage when known.
    Failure(Option<DeploymentStage>),
}

/// Drives a step board while a deployment runs.
#[derive(Debug)]
pub struct ProgressTracker {
    settings: ProgressSettings,
    board: Arc<watch::Sender<StepBoard>>,
    ticker: Option<JoinHandle<()>>,
}

impl ProgressTracker {
    /// Creates a tracker with the default eight-step board.
    #[must_use]
    pub fn new(settings: ProgressSettings) -> Self {
        Self::with_board(settings, StepBoard::new())
    }

    /// Creates a tracker over a custom board.
    #[must_use]
    pub fn with_board(settings: ProgressSettings, board: StepBoard) -> Self {
        let (sender, _) = watch::channel(board);
        Self {
            settings,
            board: Arc::new(sender),
            ticker: None,
        }
    }

    /// Starts advancing the board. Must be called inside a Tokio runtime.
    ///
    /// Calling `start` on a running tracker has no effect.
    pub fn start(&mut self) {
        if self.ticker.is_some() || self.board.borrow().is_finished() {
            return;
        }

        let board = Arc::clone(&self.board);
        let period = self.settings.tick();
        let increment = self.settings.increment;
        debug!("Progress tracker started: +{increment}% every {period:?}");

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut done = false;
                board.send_modify(|b| {
                    b.advance(increment);
                    done = b.is_finished();
                });
                if done {
                    break;
                }
            }
        }));
    }

    /// Returns a receiver that observes every board update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StepBoard> {
        self.board.subscribe()
    }

    /// Returns a copy of the current board.
    #[must_use]
    pub fn snapshot(&self) -> StepBoard {
        self.board.borrow().clone()
    }

    /// Returns true while the ticker is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the ticker and applies the real outcome.
    pub fn finish(&mut self, outcome: TrackerOutcome) {
        self.stop();
        self.board.send_modify(|b| match outcome {
            TrackerOutcome::Success => b.finish_success(),
            TrackerOutcome::Failure(stage) => b.finish_failure(stage.map(DeploymentStage::index)),
        });
        debug!("Progress tracker finished: {outcome:?}");
    }

    /// Stops the ticker and leaves the board as it is.
    ///
    /// Only the display stops; whatever the board was tracking carries on.
    pub fn cancel(&mut self) {
        self.stop();
        debug!("Progress tracker cancelled");
    }

    fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
