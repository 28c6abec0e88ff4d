// Launch constants (No magic values)
use crate::domain::{LaunchMode, ResourceType};

/// Tasks requested per study launch
pub const TASKS_PER_LAUNCH: i32 = 1;

/// Study tasks always run on platform-managed compute
pub const STUDY_LAUNCH_MODE: LaunchMode = LaunchMode::Fargate;

/// Resource types the existence probe is restricted to
pub const STUDY_RESOURCE_TYPES: [ResourceType; 2] =
    [ResourceType::Task, ResourceType::TaskDefinition];
