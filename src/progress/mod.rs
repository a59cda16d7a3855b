//! Step progress for deployments.
//!
//! - [`StepBoard`]: the pure step state machine
//! - [`ProgressTracker`]: drives a board on a timer and reconciles it with the
//!   real outcome

mod steps;
mod tracker;

pub use steps::{DeploymentStage, StepBoard, StepStatus, TrackedStep};
pub use tracker::{ProgressTracker, TrackerOutcome};
