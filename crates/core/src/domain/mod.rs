// Domain Layer - Pure study launch entities

pub mod error;
pub mod launch;
pub mod resource;
pub mod study;
pub mod task_definition;

// Re-exports
pub use error::DomainError;
pub use launch::{
    LaunchMode, NetworkPlacement, PlacementFailure, PlacementStatus, RunTaskOutput,
    RunTaskRequest, RunningTask,
};
pub use resource::{ProbeReport, ResourcePage, ResourceType, TagQuery, TaggedResource};
pub use study::{StudyId, StudyLaunchRequest};
pub use task_definition::{
    ContainerSpec, EnvVar, LogConfig, NativeContainer, PortMapping, RegisteredTaskDefinition,
    SecretRef, Tag, TaskDefinitionDraft, TaskTemplate,
};

/// Tag key that marks every resource created for a study
pub const STUDY_TAG_KEY: &str = "studyId";
