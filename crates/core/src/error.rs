// Central Error Type for the Study Launcher

use crate::port::PlatformError;
use serde::Serialize;
use thiserror::Error;

/// Operation an error was raised from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    DeriveTaskDefinition,
    LaunchTask,
    ProbeExistence,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::DeriveTaskDefinition => write!(f, "derive_task_definition"),
            Operation::LaunchTask => write!(f, "launch_task"),
            Operation::ProbeExistence => write!(f, "probe_existence"),
        }
    }
}

/// Identifying parameters attached to every platform-facing error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    pub operation: Operation,
    pub study_id: String,
    pub cluster: Option<String>,
}

impl ErrorContext {
    pub fn new(operation: Operation, study_id: impl Into<String>) -> Self {
        Self {
            operation,
            study_id: study_id.into(),
            cluster: None,
        }
    }

    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (study {}", self.operation, self.study_id)?;
        if let Some(cluster) = &self.cluster {
            write!(f, ", cluster {}", cluster)?;
        }
        write!(f, ")")
    }
}

/// Matchable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    TemplateFetch,
    Registration,
    Launch,
    Probe,
    Cancelled,
    DeadlineExceeded,
    Validation,
}

/// Application-level error type
///
/// Every variant is terminal for the operation that raised it; nothing in
/// the core retries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StudyError {
    #[error("{context}: base task definition not found: {definition}")]
    NotFound {
        context: ErrorContext,
        definition: String,
    },

    #[error("{context}: failed to describe base task definition: {source}")]
    TemplateFetch {
        context: ErrorContext,
        source: PlatformError,
    },

    #[error("{context}: task definition registration rejected: {source}")]
    Registration {
        context: ErrorContext,
        source: PlatformError,
    },

    #[error("{context}: run request rejected: {source}")]
    Launch {
        context: ErrorContext,
        source: PlatformError,
    },

    #[error("{context}: tag index query failed: {source}")]
    Probe {
        context: ErrorContext,
        source: PlatformError,
    },

    #[error("{context}: cancelled")]
    Cancelled { context: ErrorContext },

    #[error("{context}: deadline of {timeout_ms}ms exceeded")]
    DeadlineExceeded {
        context: ErrorContext,
        timeout_ms: u128,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] crate::domain::DomainError),
}

impl StudyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StudyError::NotFound { .. } => ErrorKind::NotFound,
            StudyError::TemplateFetch { .. } => ErrorKind::TemplateFetch,
            StudyError::Registration { .. } => ErrorKind::Registration,
            StudyError::Launch { .. } => ErrorKind::Launch,
            StudyError::Probe { .. } => ErrorKind::Probe,
            StudyError::Cancelled { .. } => ErrorKind::Cancelled,
            StudyError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            StudyError::Validation(_) => ErrorKind::Validation,
        }
    }

    /// Operation, study and cluster the error belongs to (None for validation)
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            StudyError::NotFound { context, .. }
            | StudyError::TemplateFetch { context, .. }
            | StudyError::Registration { context, .. }
            | StudyError::Launch { context, .. }
            | StudyError::Probe { context, .. }
            | StudyError::Cancelled { context }
            | StudyError::DeadlineExceeded { context, .. } => Some(context),
            StudyError::Validation(_) => None,
        }
    }
}

/// Result type alias using StudyError
pub type Result<T> = std::result::Result<T, StudyError>;
