// Study Service - Launch-and-verify use cases

pub mod derive;
pub mod launch;
pub mod probe;

use crate::application::cancel::{guarded, CallOptions};
use crate::domain::{
    ProbeReport, RegisteredTaskDefinition, RunningTask, StudyId, StudyLaunchRequest,
    TaggedResource,
};
use crate::error::{ErrorContext, Operation, Result};
use crate::port::{TagIndex, TaskOrchestrator};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Outcome of a derive -> launch pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyLaunch {
    pub definition: RegisteredTaskDefinition,
    pub task: RunningTask,
}

/// Outcome of `launch_if_absent`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum LaunchDecision {
    /// Resources tagged with the study already exist; nothing was launched
    Skipped { existing: Vec<TaggedResource> },
    Launched(StudyLaunch),
}

/// Study Service
///
/// Holds the two platform capabilities and exposes the three operations
/// plus the sequential pipeline. Stateless between calls.
pub struct StudyService {
    orchestrator: Arc<dyn TaskOrchestrator>,
    tag_index: Arc<dyn TagIndex>,
}

impl StudyService {
    pub fn new(orchestrator: Arc<dyn TaskOrchestrator>, tag_index: Arc<dyn TagIndex>) -> Self {
        Self {
            orchestrator,
            tag_index,
        }
    }

    /// Derive and register the study-specific task definition
    pub async fn derive(
        &self,
        request: &StudyLaunchRequest,
        options: &CallOptions,
    ) -> Result<RegisteredTaskDefinition> {
        let context = ErrorContext::new(Operation::DeriveTaskDefinition, request.study_id.as_str())
            .with_cluster(&request.cluster);
        guarded(
            &context,
            options,
            derive::execute(
                self.orchestrator.as_ref(),
                &request.cluster,
                &request.base_task_definition,
                &request.study_id,
                &request.study_image,
            ),
        )
        .await
    }

    /// Run one study task from `family`
    pub async fn launch(
        &self,
        family: &str,
        request: &StudyLaunchRequest,
        options: &CallOptions,
    ) -> Result<RunningTask> {
        let context = ErrorContext::new(Operation::LaunchTask, request.study_id.as_str())
            .with_cluster(&request.cluster);
        guarded(
            &context,
            options,
            launch::execute(
                self.orchestrator.as_ref(),
                family,
                &request.cluster,
                &request.subnet,
                &request.security_group,
                &request.study_id,
            ),
        )
        .await
    }

    /// Probe the tag index for the study's resources (all pages)
    pub async fn probe(&self, study_id: &StudyId, options: &CallOptions) -> Result<ProbeReport> {
        let context = ErrorContext::new(Operation::ProbeExistence, study_id.as_str());
        guarded(
            &context,
            options,
            probe::execute(self.tag_index.as_ref(), study_id),
        )
        .await
    }

    /// True iff any task or task definition is tagged with the study
    ///
    /// Eventually consistent: `false` right after a launch is not proof the
    /// launch failed.
    pub async fn exists(&self, study_id: &StudyId, options: &CallOptions) -> Result<bool> {
        Ok(self.probe(study_id, options).await?.exists())
    }

    /// Derive then launch, stopping at the first error
    ///
    /// `options` applies to each step separately.
    pub async fn launch_study(
        &self,
        request: &StudyLaunchRequest,
        options: &CallOptions,
    ) -> Result<StudyLaunch> {
        let definition = self.derive(request, options).await?;
        let task = self.launch(&definition.family, request, options).await?;

        info!(
            study_id = %request.study_id,
            definition = %definition,
            status = %task.status(),
            "Study launch finished"
        );

        Ok(StudyLaunch { definition, task })
    }

    /// Probe first and launch only when nothing is tagged with the study
    ///
    /// Not a lock: two concurrent callers can both see `false` and both
    /// launch, and a recent launch may not be indexed yet.
    pub async fn launch_if_absent(
        &self,
        request: &StudyLaunchRequest,
        options: &CallOptions,
    ) -> Result<LaunchDecision> {
        let report = self.probe(&request.study_id, options).await?;
        if report.exists() {
            info!(
                study_id = %request.study_id,
                existing = report.matched.len(),
                "Study resources already exist, skipping launch"
            );
            return Ok(LaunchDecision::Skipped {
                existing: report.matched,
            });
        }

        self.launch_study(request, options)
            .await
            .map(LaunchDecision::Launched)
    }
}
