// Launch Use Case
// Runs one study task from a registered family

use crate::application::constants::{STUDY_LAUNCH_MODE, TASKS_PER_LAUNCH};
use crate::domain::{NetworkPlacement, RunTaskRequest, RunningTask, StudyId};
use crate::error::{ErrorContext, Operation, Result, StudyError};
use crate::port::TaskOrchestrator;
use tracing::{info, warn};

/// Build the run request for a study
pub fn build_request(
    family: &str,
    cluster: &str,
    subnet: &str,
    security_group: &str,
    study_id: &StudyId,
) -> RunTaskRequest {
    RunTaskRequest {
        task_definition: family.to_string(),
        cluster: cluster.to_string(),
        launch_mode: STUDY_LAUNCH_MODE,
        count: TASKS_PER_LAUNCH,
        placement: NetworkPlacement::single(subnet, security_group),
        tags: vec![study_id.tag()],
    }
}

/// Execute launch use case
///
/// Placement failures are carried in the returned `RunningTask`; only an
/// outright rejection of the call is an error.
pub async fn execute(
    orchestrator: &dyn TaskOrchestrator,
    family: &str,
    cluster: &str,
    subnet: &str,
    security_group: &str,
    study_id: &StudyId,
) -> Result<RunningTask> {
    let request = build_request(family, cluster, subnet, security_group, study_id);

    info!(
        study_id = %study_id,
        family = %family,
        cluster = %cluster,
        launch_mode = %request.launch_mode,
        "Submitting run request"
    );

    let output = orchestrator
        .run_task(&request)
        .await
        .map_err(|source| StudyError::Launch {
            context: ErrorContext::new(Operation::LaunchTask, study_id.as_str())
                .with_cluster(cluster),
            source,
        })?;

    let task = RunningTask::from_output(study_id.clone(), request.tags, output);

    if task.is_success() {
        info!(
            study_id = %study_id,
            tasks = ?task.task_arns,
            "Study task placed"
        );
    } else {
        warn!(
            study_id = %study_id,
            cluster = %cluster,
            status = %task.status(),
            placed = task.task_arns.len(),
            reasons = ?task.failure_reasons(),
            "Study task placement incomplete"
        );
    }

    Ok(task)
}
