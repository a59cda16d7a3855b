//! Deployment stages and the step board state machine.

use serde::Serialize;
use std::fmt;

/// A coarse deployment stage; each stage owns one step on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStage {
    /// Request and provider checks.
    Validation,
    /// Credential validation and auth context.
    Authentication,
    /// Resource group or stack creation.
    Provisioning,
    /// Compute, OS and storage.
    Compute,
    /// Network and security.
    Network,
    /// Workload-specific components.
    Workload,
    /// Post-deploy health checks.
    HealthCheck,
    /// Endpoint handed back to the caller.
    Complete,
}

/// Status of a tracked step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Not started.
    Pending,
    /// In progress.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Error,
}

/// One step on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackedStep {
    /// One-based step id.
    pub id: usize,
    /// Display title.
    pub title: String,
    /// Current status.
    pub status: StepStatus,
}

/// Ordered step list with a percentage.
///
/// While the timer drives it, statuses only move forward: pending, running,
/// then completed. A failed outcome overrides whatever the timer showed.
/// Once finished the board ignores further updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepBoard {
    steps: Vec<TrackedStep>,
    percent: u8,
    finished: bool,
}

/// Highest percentage reached before the real outcome is known.
const MAX_UNFINISHED_PERCENT: u8 = 99;

impl DeploymentStage {
    /// All stages in board order.
    pub const ALL: [Self; 8] = [
        Self::Validation,
        Self::Authentication,
        Self::Provisioning,
        Self::Compute,
        Self::Network,
        Self::Workload,
        Self::HealthCheck,
        Self::Complete,
    ];

    /// Position of this stage on the board.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Default step title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Validation => "Validating configuration",
            Self::Authentication => "Authenticating with provider",
            Self::Provisioning => "Provisioning cloud resources",
            Self::Compute => "Setting up virtual machine",
            Self::Network => "Configuring network and security",
            Self::Workload => "Installing workload components",
            Self::HealthCheck => "Running health checks",
            Self::Complete => "Deployment complete",
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl StepStatus {
    const fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Completed | Self::Error => 2,
        }
    }

    /// Returns true for completed and error.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.rank() == 2
    }
}

impl TrackedStep {
    /// Moves to `next` if that is a forward transition.
    fn transition(&mut self, next: StepStatus) {
        if next.rank() > self.status.rank() {
            self.status = next;
        }
    }
}

impl StepBoard {
    /// Creates a board with one pending step per stage.
    #[must_use]
    pub fn new() -> Self {
        Self::with_titles(DeploymentStage::ALL.iter().map(|s| s.title()))
    }

    /// Creates a board with custom titles.
    #[must_use]
    pub fn with_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let steps = titles
            .into_iter()
            .enumerate()
            .map(|(i, title)| TrackedStep {
                id: i + 1,
                title: title.into(),
                status: StepStatus::Pending,
            })
            .collect();
        Self {
            steps,
            percent: 0,
            finished: false,
        }
    }

    /// Steps in order.
    #[must_use]
    pub fn steps(&self) -> &[TrackedStep] {
        &self.steps
    }

    /// Current percentage.
    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.percent
    }

    /// Returns true once the real outcome has been applied.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Index of the running step, if any.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.status == StepStatus::Running)
    }

    /// Advances the percentage and the step statuses that follow from it.
    ///
    /// Stops short of 100 so the board never claims success on its own.
    pub fn advance(&mut self, increment: u8) {
        if self.finished || self.steps.is_empty() {
            return;
        }

        self.percent = self
            .percent
            .saturating_add(increment)
            .min(MAX_UNFINISHED_PERCENT);

        let active = (usize::from(self.percent) * self.steps.len() / 100).min(self.steps.len() - 1);
        for step in &mut self.steps[..active] {
            step.transition(StepStatus::Completed);
        }
        self.steps[active].transition(StepStatus::Running);
    }

    /// Applies a successful outcome: every step completed, 100 percent.
    pub fn finish_success(&mut self) {
        if self.finished {
            return;
        }
        for step in &mut self.steps {
            step.transition(StepStatus::Completed);
        }
        self.percent = 100;
        self.finished = true;
    }

    /// Applies a failed outcome.
    ///
    /// The step at `at` becomes an error even if the timer already showed it
    /// completed. Earlier steps keep a completed status and every unfinished
    /// one becomes an error. Later steps go back to pending. `None` fails the
    /// last step shown, or the first step if nothing started.
    pub fn finish_failure(&mut self, at: Option<usize>) {
        if self.finished || self.steps.is_empty() {
            self.finished = true;
            return;
        }

        let failed = at
            .unwrap_or_else(|| {
                self.steps
                    .iter()
                    .rposition(|s| s.status != StepStatus::Pending)
                    .unwrap_or(0)
            })
            .min(self.steps.len() - 1);

        for step in &mut self.steps[..failed] {
            step.transition(StepStatus::Error);
        }
        self.steps[failed].status = StepStatus::Error;
        for step in &mut self.steps[failed + 1..] {
            step.status = StepStatus::Pending;
        }
        self.percent = self.percent.min(percent_before(failed, self.steps.len()));
        self.finished = true;
    }
}

/// Percentage at which the board starts showing step `index`.
fn percent_before(index: usize, total: usize) -> u8 {
    u8::try_from(index * 100 / total).unwrap_or(MAX_UNFINISHED_PERCENT)
}

impl Default for StepBoard {
    fn default() -> Self {
        Self::new()
    }
}
