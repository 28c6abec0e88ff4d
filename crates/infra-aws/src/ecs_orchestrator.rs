// ECS orchestrator implementation
// reason: async-trait for the port, aws-sdk-ecs for the platform calls
use async_trait::async_trait;
use aws_sdk_ecs::error::{DisplayErrorContext, SdkError};
use aws_sdk_ecs::operation::describe_task_definition::DescribeTaskDefinitionError;
use aws_sdk_ecs::operation::register_task_definition::RegisterTaskDefinitionError;
use aws_sdk_ecs::operation::run_task::RunTaskError;
use aws_sdk_ecs::types::{AwsVpcConfiguration, NetworkConfiguration};
use aws_sdk_ecs::Client as EcsClient;
use tracing::{debug, info};

use enclave_core::domain::{
    RegisteredTaskDefinition, RunTaskOutput, RunTaskRequest, TaskDefinitionDraft, TaskTemplate,
};
use enclave_core::port::{PlatformError, TaskOrchestrator};

use crate::convert;

/// AWS ECS orchestrator
pub struct EcsOrchestrator {
    client: EcsClient,
}

impl EcsOrchestrator {
    /// Create from a loaded SDK configuration
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: EcsClient::new(config),
        }
    }

    /// Wrap an existing client
    pub fn from_client(client: EcsClient) -> Self {
        Self { client }
    }
}

fn describe_error(
    task_definition: &str,
    err: SdkError<DescribeTaskDefinitionError>,
) -> PlatformError {
    match err.as_service_error() {
        Some(service) => describe_service_error(task_definition, service),
        None => PlatformError::Unavailable(DisplayErrorContext(&err).to_string()),
    }
}

fn describe_service_error(
    task_definition: &str,
    err: &DescribeTaskDefinitionError,
) -> PlatformError {
    let message = DisplayErrorContext(err).to_string();
    match err {
        // ECS answers an unknown family/revision with a client exception
        DescribeTaskDefinitionError::ClientException(_)
        | DescribeTaskDefinitionError::InvalidParameterException(_) => {
            PlatformError::NotFound(format!("{}: {}", task_definition, message))
        }
        _ => PlatformError::Unavailable(message),
    }
}

fn register_error(err: SdkError<RegisterTaskDefinitionError>) -> PlatformError {
    match err.as_service_error() {
        Some(service) => register_service_error(service),
        None => PlatformError::Unavailable(DisplayErrorContext(&err).to_string()),
    }
}

fn register_service_error(err: &RegisterTaskDefinitionError) -> PlatformError {
    let message = DisplayErrorContext(err).to_string();
    match err {
        RegisterTaskDefinitionError::ClientException(_)
        | RegisterTaskDefinitionError::InvalidParameterException(_) => {
            PlatformError::Rejected(message)
        }
        _ => PlatformError::Unavailable(message),
    }
}

fn run_error(err: SdkError<RunTaskError>) -> PlatformError {
    match err.as_service_error() {
        Some(service) => run_service_error(service),
        None => PlatformError::Unavailable(DisplayErrorContext(&err).to_string()),
    }
}

fn run_service_error(err: &RunTaskError) -> PlatformError {
    let message = DisplayErrorContext(err).to_string();
    match err {
        RunTaskError::ClientException(_)
        | RunTaskError::InvalidParameterException(_)
        | RunTaskError::ClusterNotFoundException(_) => PlatformError::Rejected(message),
        _ => PlatformError::Unavailable(message),
    }
}

#[async_trait]
impl TaskOrchestrator for EcsOrchestrator {
    async fn describe_task_definition(
        &self,
        task_definition: &str,
    ) -> Result<TaskTemplate, PlatformError> {
        debug!(task_definition = %task_definition, "DescribeTaskDefinition");

        let output = self
            .client
            .describe_task_definition()
            .task_definition(task_definition)
            .send()
            .await
            .map_err(|e| describe_error(task_definition, e))?;

        let definition = output
            .task_definition()
            .ok_or_else(|| PlatformError::NotFound(task_definition.to_string()))?;

        convert::template_from_ecs(definition)
    }

    async fn register_task_definition(
        &self,
        draft: &TaskDefinitionDraft,
    ) -> Result<RegisteredTaskDefinition, PlatformError> {
        let containers = draft
            .containers
            .iter()
            .map(convert::container_to_ecs)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            family = %draft.family,
            containers = containers.len(),
            "RegisterTaskDefinition"
        );

        let output = self
            .client
            .register_task_definition()
            .family(&draft.family)
            .set_container_definitions(Some(containers))
            .set_task_role_arn(draft.task_role_arn.clone())
            .set_execution_role_arn(draft.execution_role_arn.clone())
            .set_network_mode(draft.network_mode.as_deref().map(convert::network_mode_to_ecs))
            .set_cpu(draft.cpu.clone())
            .set_memory(draft.memory.clone())
            .set_requires_compatibilities(Some(
                draft
                    .requires_compatibilities
                    .iter()
                    .map(|c| convert::compatibility_to_ecs(c))
                    .collect(),
            ))
            .set_tags(Some(draft.tags.iter().map(convert::tag_to_ecs).collect()))
            .send()
            .await
            .map_err(register_error)?;

        let registered = output.task_definition().ok_or_else(|| {
            PlatformError::Unavailable("registration response without task definition".to_string())
        })?;

        let result = RegisteredTaskDefinition {
            family: registered.family().unwrap_or(&draft.family).to_string(),
            revision: registered.revision(),
            arn: registered.task_definition_arn().map(str::to_string),
        };

        info!(
            family = %result.family,
            revision = result.revision,
            "Task definition registered"
        );

        Ok(result)
    }

    async fn run_task(&self, request: &RunTaskRequest) -> Result<RunTaskOutput, PlatformError> {
        let vpc = AwsVpcConfiguration::builder()
            .set_subnets(Some(request.placement.subnets.clone()))
            .set_security_groups(Some(request.placement.security_groups.clone()))
            .build()
            .map_err(|e| PlatformError::Rejected(format!("network configuration: {}", e)))?;

        debug!(
            task_definition = %request.task_definition,
            cluster = %request.cluster,
            count = request.count,
            "RunTask"
        );

        let output = self
            .client
            .run_task()
            .task_definition(&request.task_definition)
            .cluster(&request.cluster)
            .launch_type(convert::launch_type_to_ecs(request.launch_mode))
            .count(request.count)
            .network_configuration(
                NetworkConfiguration::builder()
                    .awsvpc_configuration(vpc)
                    .build(),
            )
            .set_tags(Some(request.tags.iter().map(convert::tag_to_ecs).collect()))
            .send()
            .await
            .map_err(run_error)?;

        Ok(RunTaskOutput {
            task_arns: output
                .tasks()
                .iter()
                .filter_map(|t| t.task_arn().map(str::to_string))
                .collect(),
            failures: output
                .failures()
                .iter()
                .map(convert::failure_from_ecs)
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ecs::error::ErrorMetadata;
    use aws_sdk_ecs::types::error::{
        ClientException, ClusterNotFoundException, InvalidParameterException, ServerException,
    };

    fn throttled() -> ErrorMetadata {
        ErrorMetadata::builder()
            .code("ThrottlingException")
            .message("Rate exceeded")
            .build()
    }

    #[test]
    fn test_describe_client_exception_is_not_found() {
        let err = DescribeTaskDefinitionError::ClientException(
            ClientException::builder()
                .message("Unable to describe task definition.")
                .build(),
        );

        match describe_service_error("ResearchContainerTaskDef", &err) {
            PlatformError::NotFound(msg) => assert!(msg.contains("ResearchContainerTaskDef")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_describe_invalid_parameter_is_not_found() {
        let err = DescribeTaskDefinitionError::InvalidParameterException(
            InvalidParameterException::builder().message("bad").build(),
        );
        assert!(matches!(
            describe_service_error("base", &err),
            PlatformError::NotFound(_)
        ));
    }

    #[test]
    fn test_describe_server_and_throttling_are_unavailable() {
        let server = DescribeTaskDefinitionError::ServerException(
            ServerException::builder().message("internal").build(),
        );
        assert!(matches!(
            describe_service_error("base", &server),
            PlatformError::Unavailable(_)
        ));

        let throttling = DescribeTaskDefinitionError::generic(throttled());
        assert!(matches!(
            describe_service_error("base", &throttling),
            PlatformError::Unavailable(_)
        ));
    }

    #[test]
    fn test_describe_transport_failure_is_unavailable() {
        let err = SdkError::<DescribeTaskDefinitionError>::timeout_error("connect timed out");
        assert!(matches!(
            describe_error("base", err),
            PlatformError::Unavailable(_)
        ));
    }

    #[test]
    fn test_register_client_errors_are_rejected() {
        let client = RegisterTaskDefinitionError::ClientException(
            ClientException::builder()
                .message("Role is not valid")
                .build(),
        );
        let invalid = RegisterTaskDefinitionError::InvalidParameterException(
            InvalidParameterException::builder()
                .message("Invalid setting for container")
                .build(),
        );

        assert!(matches!(
            register_service_error(&client),
            PlatformError::Rejected(_)
        ));
        assert!(matches!(
            register_service_error(&invalid),
            PlatformError::Rejected(_)
        ));
    }

    #[test]
    fn test_register_throttling_is_unavailable() {
        let err = RegisterTaskDefinitionError::generic(throttled());
        assert!(matches!(
            register_service_error(&err),
            PlatformError::Unavailable(_)
        ));

        let err = SdkError::<RegisterTaskDefinitionError>::timeout_error("read timed out");
        assert!(matches!(register_error(err), PlatformError::Unavailable(_)));
    }

    #[test]
    fn test_run_rejections() {
        let missing_cluster = RunTaskError::ClusterNotFoundException(
            ClusterNotFoundException::builder()
                .message("Cluster not found.")
                .build(),
        );
        let invalid = RunTaskError::InvalidParameterException(
            InvalidParameterException::builder()
                .message("subnet does not exist")
                .build(),
        );

        assert!(matches!(
            run_service_error(&missing_cluster),
            PlatformError::Rejected(_)
        ));
        assert!(matches!(
            run_service_error(&invalid),
            PlatformError::Rejected(_)
        ));
    }

    #[test]
    fn test_run_server_and_transport_failures_are_unavailable() {
        let server = RunTaskError::ServerException(ServerException::builder().build());
        assert!(matches!(
            run_service_error(&server),
            PlatformError::Unavailable(_)
        ));

        let err = SdkError::<RunTaskError>::timeout_error("connect timed out");
        assert!(matches!(run_error(err), PlatformError::Unavailable(_)));
    }
}
