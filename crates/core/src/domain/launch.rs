// Task Launch Domain Model

use super::study::StudyId;
use super::task_definition::Tag;
use serde::{Deserialize, Serialize};

/// Task placement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaunchMode {
    /// Platform-managed compute (no caller-managed hosts)
    Fargate,
}

impl std::fmt::Display for LaunchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchMode::Fargate => write!(f, "FARGATE"),
        }
    }
}

/// Network interface placement for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPlacement {
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
}

impl NetworkPlacement {
    /// One interface bound to exactly one subnet and one security group
    pub fn single(subnet: impl Into<String>, security_group: impl Into<String>) -> Self {
        Self {
            subnets: vec![subnet.into()],
            security_groups: vec![security_group.into()],
        }
    }
}

/// Run request submitted to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTaskRequest {
    /// Family (or `family:revision`) to run
    pub task_definition: String,
    pub cluster: String,
    pub launch_mode: LaunchMode,
    pub count: i32,
    pub placement: NetworkPlacement,
    pub tags: Vec<Tag>,
}

/// A task the platform could not place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementFailure {
    pub arn: Option<String>,
    /// Reason code, e.g. `RESOURCE:CPU`
    pub reason: String,
    pub detail: Option<String>,
}

impl PlacementFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            arn: None,
            reason: reason.into(),
            detail: None,
        }
    }
}

/// Raw run response (accepted call, placement may still have failed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTaskOutput {
    pub task_arns: Vec<String>,
    pub failures: Vec<PlacementFailure>,
}

/// Placement classification of a launch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementStatus {
    /// Tasks were placed and no failure was reported
    Placed,
    /// At least one placement failure was reported
    PartialLaunchFailure,
    /// The platform reported neither tasks nor failures
    NothingPlaced,
}

impl PlacementStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, PlacementStatus::Placed)
    }
}

impl std::fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementStatus::Placed => write!(f, "PLACED"),
            PlacementStatus::PartialLaunchFailure => write!(f, "PARTIAL_LAUNCH_FAILURE"),
            PlacementStatus::NothingPlaced => write!(f, "NOTHING_PLACED"),
        }
    }
}

/// Result of launching a study task
///
/// Both placed tasks and placement failures are kept; a launch is only a
/// success when `status()` is `Placed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningTask {
    pub study_id: StudyId,
    pub task_arns: Vec<String>,
    pub failures: Vec<PlacementFailure>,
    pub tags: Vec<Tag>,
}

impl RunningTask {
    pub fn from_output(study_id: StudyId, tags: Vec<Tag>, output: RunTaskOutput) -> Self {
        Self {
            study_id,
            task_arns: output.task_arns,
            failures: output.failures,
            tags,
        }
    }

    pub fn status(&self) -> PlacementStatus {
        if !self.failures.is_empty() {
            PlacementStatus::PartialLaunchFailure
        } else if self.task_arns.is_empty() {
            PlacementStatus::NothingPlaced
        } else {
            PlacementStatus::Placed
        }
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Failure reason codes, in platform order
    pub fn failure_reasons(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.reason.as_str()).collect()
    }
}
