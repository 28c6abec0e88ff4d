// Port Layer - Interfaces for external platform capabilities

pub mod error;
pub mod orchestrator;
pub mod tag_index;

// Re-exports
pub use error::PlatformError;
pub use orchestrator::TaskOrchestrator;
pub use tag_index::TagIndex;
