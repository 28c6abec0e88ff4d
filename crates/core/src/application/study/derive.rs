// Derive Use Case
// Base template -> study-specific task definition

use crate::domain::{
    ContainerSpec, RegisteredTaskDefinition, StudyId, TaskDefinitionDraft, TaskTemplate,
};
use crate::error::{ErrorContext, Operation, Result, StudyError};
use crate::port::{PlatformError, TaskOrchestrator};
use tracing::{debug, info};

/// Family of the study-specific definition: `{base_family}-{study_id}`
///
/// Stable per (base family, study) pair, so registering again adds a
/// revision to the same family.
pub fn derived_family(base_family: &str, study_id: &StudyId) -> String {
    format!("{}-{}", base_family, study_id)
}

/// Build the study-specific draft from a base template
///
/// Every container keeps all of its fields except `image`, which becomes
/// `study_image`. Container order and count are preserved.
pub fn derive_definition(
    template: &TaskTemplate,
    study_id: &StudyId,
    study_image: &str,
) -> TaskDefinitionDraft {
    let containers = template
        .containers
        .iter()
        .map(|container| ContainerSpec {
            image: Some(study_image.to_string()),
            ..container.clone()
        })
        .collect();

    TaskDefinitionDraft {
        family: derived_family(&template.family, study_id),
        containers,
        task_role_arn: template.task_role_arn.clone(),
        execution_role_arn: template.execution_role_arn.clone(),
        network_mode: template.network_mode.clone(),
        cpu: template.cpu.clone(),
        memory: template.memory.clone(),
        requires_compatibilities: template.requires_compatibilities.clone(),
        tags: vec![study_id.tag()],
    }
}

/// Execute derive use case
///
/// # Arguments
///
/// * `orchestrator` - Orchestration API
/// * `cluster` - Cluster the study will run on (error context only)
/// * `base_task_definition` - Base template identifier
/// * `study_id` - Study identifier
/// * `study_image` - Image every container of the study runs
pub async fn execute(
    orchestrator: &dyn TaskOrchestrator,
    cluster: &str,
    base_task_definition: &str,
    study_id: &StudyId,
    study_image: &str,
) -> Result<RegisteredTaskDefinition> {
    let context = || {
        ErrorContext::new(Operation::DeriveTaskDefinition, study_id.as_str()).with_cluster(cluster)
    };

    info!(
        study_id = %study_id,
        base_task_definition = %base_task_definition,
        "Describing base task definition"
    );

    let template = orchestrator
        .describe_task_definition(base_task_definition)
        .await
        .map_err(|e| match e {
            PlatformError::NotFound(_) => StudyError::NotFound {
                context: context(),
                definition: base_task_definition.to_string(),
            },
            other => StudyError::TemplateFetch {
                context: context(),
                source: other,
            },
        })?;

    let draft = derive_definition(&template, study_id, study_image);

    debug!(
        family = %draft.family,
        containers = draft.containers.len(),
        "Registering derived task definition"
    );

    let registered = orchestrator
        .register_task_definition(&draft)
        .await
        .map_err(|source| StudyError::Registration {
            context: context(),
            source,
        })?;

    info!(
        study_id = %study_id,
        family = %registered.family,
        revision = registered.revision,
        "Registered derived task definition"
    );

    Ok(registered)
}

#[cfg(test)]
#[path = "derive_test.rs"]
mod derive_test;
