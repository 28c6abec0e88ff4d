// Enclave Infrastructure - AWS Adapters
// Implements: TaskOrchestrator (ECS), TagIndex (Resource Groups Tagging API)

mod convert;
pub mod ecs_orchestrator;
pub mod tagging_index;

pub use ecs_orchestrator::EcsOrchestrator;
pub use tagging_index::TaggingIndex;

/// Load the shared AWS configuration (env, profile, IMDS), optionally
/// pinned to `region`
pub async fn load_sdk_config(region: Option<String>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(aws_config::Region::new(region));
    }
    loader.load().await
}
