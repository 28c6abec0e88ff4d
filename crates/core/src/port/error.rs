// Platform call errors reported by adapters

use thiserror::Error;

/// Failure of a single remote platform call
///
/// Adapters translate SDK errors into these; the application layer tags
/// them with the operation and study they belong to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The referenced resource does not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// The platform refused the request (invalid role, bad parameter, ...)
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Transport failure, throttling or permission denial
    #[error("Unavailable: {0}")]
    Unavailable(String),
}
