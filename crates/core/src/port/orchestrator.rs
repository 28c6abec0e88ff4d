// Task Orchestrator Port
// Abstraction over the container orchestration API (describe/register/run)

use super::error::PlatformError;
use crate::domain::{
    RegisteredTaskDefinition, RunTaskOutput, RunTaskRequest, TaskDefinitionDraft, TaskTemplate,
};
use async_trait::async_trait;

/// Container orchestration capability
///
/// Implementations:
/// - EcsOrchestrator: AWS ECS (enclave-infra-aws)
/// - InMemoryOrchestrator: in-process fake for tests
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskOrchestrator: Send + Sync {
    /// Describe a task definition by family, `family:revision` or ARN
    ///
    /// # Errors
    /// - PlatformError::NotFound if the identifier does not resolve
    async fn describe_task_definition(
        &self,
        task_definition: &str,
    ) -> Result<TaskTemplate, PlatformError>;

    /// Register a new task definition revision
    ///
    /// # Errors
    /// - PlatformError::Rejected if the platform refuses the definition
    async fn register_task_definition(
        &self,
        draft: &TaskDefinitionDraft,
    ) -> Result<RegisteredTaskDefinition, PlatformError>;

    /// Submit a run request
    ///
    /// Placement failures are part of the returned output, not errors.
    async fn run_task(&self, request: &RunTaskRequest) -> Result<RunTaskOutput, PlatformError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// How the fake answers run requests
    #[derive(Debug, Clone)]
    pub enum RunBehavior {
        /// Place every requested task
        Place,
        /// Return this output verbatim
        Respond(RunTaskOutput),
        /// Reject the call outright
        Reject(String),
    }

    #[derive(Default)]
    struct State {
        templates: HashMap<String, TaskTemplate>,
        registered: HashMap<String, Vec<TaskDefinitionDraft>>,
        registration_error: Option<String>,
        run_behavior: Option<RunBehavior>,
        run_requests: Vec<RunTaskRequest>,
        describe_calls: usize,
    }

    /// In-memory orchestrator for testing
    ///
    /// Registration appends a revision per family, the way the real
    /// platform versions families.
    #[derive(Default)]
    pub struct InMemoryOrchestrator {
        state: Mutex<State>,
    }

    impl InMemoryOrchestrator {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make `template` resolvable under `id`
        pub fn with_template(self, id: impl Into<String>, template: TaskTemplate) -> Self {
            self.state
                .lock()
                .unwrap()
                .templates
                .insert(id.into(), template);
            self
        }

        pub fn reject_registration(&self, message: impl Into<String>) {
            self.state.lock().unwrap().registration_error = Some(message.into());
        }

        pub fn set_run_behavior(&self, behavior: RunBehavior) {
            self.state.lock().unwrap().run_behavior = Some(behavior);
        }

        /// Every draft registered under `family`, oldest first
        pub fn revisions(&self, family: &str) -> Vec<TaskDefinitionDraft> {
            self.state
                .lock()
                .unwrap()
                .registered
                .get(family)
                .cloned()
                .unwrap_or_default()
        }

        pub fn families(&self) -> Vec<String> {
            let mut families: Vec<String> =
                self.state.lock().unwrap().registered.keys().cloned().collect();
            families.sort();
            families
        }

        pub fn run_requests(&self) -> Vec<RunTaskRequest> {
            self.state.lock().unwrap().run_requests.clone()
        }

        pub fn describe_calls(&self) -> usize {
            self.state.lock().unwrap().describe_calls
        }
    }

    #[async_trait]
    impl TaskOrchestrator for InMemoryOrchestrator {
        async fn describe_task_definition(
            &self,
            task_definition: &str,
        ) -> Result<TaskTemplate, PlatformError> {
            let mut state = self.state.lock().unwrap();
            state.describe_calls += 1;
            state
                .templates
                .get(task_definition)
                .cloned()
                .ok_or_else(|| PlatformError::NotFound(task_definition.to_string()))
        }

        async fn register_task_definition(
            &self,
            draft: &TaskDefinitionDraft,
        ) -> Result<RegisteredTaskDefinition, PlatformError> {
            let mut state = self.state.lock().unwrap();
            if let Some(message) = state.registration_error.clone() {
                return Err(PlatformError::Rejected(message));
            }

            let revisions = state.registered.entry(draft.family.clone()).or_default();
            revisions.push(draft.clone());
            let revision = revisions.len() as i32;

            Ok(RegisteredTaskDefinition {
                family: draft.family.clone(),
                revision,
                arn: Some(format!(
                    "arn:aws:ecs:local:000000000000:task-definition/{}:{}",
                    draft.family, revision
                )),
            })
        }

        async fn run_task(&self, request: &RunTaskRequest) -> Result<RunTaskOutput, PlatformError> {
            let mut state = self.state.lock().unwrap();
            state.run_requests.push(request.clone());
            let n = state.run_requests.len();

            match state.run_behavior.clone().unwrap_or(RunBehavior::Place) {
                RunBehavior::Place => Ok(RunTaskOutput {
                    task_arns: (0..request.count)
                        .map(|i| {
                            format!(
                                "arn:aws:ecs:local:000000000000:task/{}/{}-{}",
                                request.cluster, n, i
                            )
                        })
                        .collect(),
                    failures: Vec::new(),
                }),
                RunBehavior::Respond(output) => Ok(output),
                RunBehavior::Reject(message) => Err(PlatformError::Rejected(message)),
            }
        }
    }
}
