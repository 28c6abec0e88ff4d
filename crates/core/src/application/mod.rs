// Application Layer - Use Cases

pub mod cancel;
pub mod constants;
pub mod study;

// Re-exports
pub use cancel::{cancel_channel, CallOptions, CancelSender, CancelToken};
pub use study::{LaunchDecision, StudyLaunch, StudyService};
