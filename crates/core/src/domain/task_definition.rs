// Task Definition Domain Model

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;

/// Resource tag (key/value)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Container environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: Option<String>,
}

/// Container port mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: Option<i32>,
    pub host_port: Option<i32>,
    pub protocol: Option<String>,
}

/// Container log driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub driver: String,
    /// Sorted for stable comparison
    pub options: Vec<(String, String)>,
}

/// Secret injected into a container from a secret store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    pub name: String,
    pub value_from: String,
}

/// Platform-native container definition an adapter described
///
/// Opaque to the core. Carried through derivation as-is so the adapter can
/// register the full definition, including fields `ContainerSpec` does not
/// model. Equality is identity.
#[derive(Clone)]
pub struct NativeContainer(Arc<dyn Any + Send + Sync>);

impl NativeContainer {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for NativeContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NativeContainer(..)")
    }
}

impl PartialEq for NativeContainer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for NativeContainer {}

/// One container of a task definition
///
/// The named fields are a read view. When `native` is set the adapter
/// registers that definition with only `image` replaced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: Option<String>,
    pub image: Option<String>,
    pub cpu: Option<i32>,
    pub memory: Option<i32>,
    pub memory_reservation: Option<i32>,
    pub essential: Option<bool>,
    pub command: Vec<String>,
    pub entry_point: Vec<String>,
    pub environment: Vec<EnvVar>,
    pub port_mappings: Vec<PortMapping>,
    pub working_directory: Option<String>,
    pub user: Option<String>,
    pub log_configuration: Option<LogConfig>,
    pub secrets: Vec<SecretRef>,
    #[serde(skip)]
    pub native: Option<NativeContainer>,
}

/// Base task definition as described by the platform (read-only input)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub family: String,
    pub containers: Vec<ContainerSpec>,
    pub task_role_arn: Option<String>,
    pub execution_role_arn: Option<String>,
    pub network_mode: Option<String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub requires_compatibilities: Vec<String>,
}

/// Study-specific task definition, ready to be registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinitionDraft {
    pub family: String,
    pub containers: Vec<ContainerSpec>,
    pub task_role_arn: Option<String>,
    pub execution_role_arn: Option<String>,
    pub network_mode: Option<String>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
    pub requires_compatibilities: Vec<String>,
    pub tags: Vec<Tag>,
}

/// Identity of a registered task definition revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredTaskDefinition {
    pub family: String,
    pub revision: i32,
    pub arn: Option<String>,
}

impl RegisteredTaskDefinition {
    /// `family:revision`, the form accepted by run requests
    pub fn family_revision(&self) -> String {
        format!("{}:{}", self.family, self.revision)
    }
}

impl std::fmt::Display for RegisteredTaskDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.family, self.revision)
    }
}
