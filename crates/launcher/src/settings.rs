//! Launcher settings
//!
//! Layered once at start: TOML file, then `ENCLAVE_*` environment
//! variables, then command-line flags. The result is passed by value into
//! the launch pipeline.

use anyhow::{Context, Result};
use enclave_core::application::CallOptions;
use enclave_core::domain::{DomainError, StudyId, StudyLaunchRequest};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "~/.enclave/launcher.toml";
pub const ENV_PREFIX: &str = "ENCLAVE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LauncherConfig {
    #[serde(default)]
    pub cluster: String,
    #[serde(default)]
    pub base_task_definition: String,
    #[serde(default)]
    pub subnet: String,
    #[serde(default)]
    pub security_group: String,
    #[serde(default)]
    pub study_id: String,
    #[serde(default)]
    pub study_image: String,
    /// AWS region (falls back to the SDK default chain)
    #[serde(default)]
    pub region: Option<String>,
    /// Per-operation deadline
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Values given on the command line; `None` leaves lower layers in effect
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cluster: Option<String>,
    pub base_task_definition: Option<String>,
    pub subnet: Option<String>,
    pub security_group: Option<String>,
    pub study_id: Option<String>,
    pub study_image: Option<String>,
    pub region: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl LauncherConfig {
    /// Load all layers
    ///
    /// A missing file is only an error when `path` was given explicitly.
    pub fn load(path: Option<&str>, overrides: &Overrides) -> Result<Self> {
        let required = path.is_some();
        let path = shellexpand::tilde(path.unwrap_or(DEFAULT_CONFIG_PATH)).into_owned();

        let settings = config::Config::builder()
            .add_source(config::File::new(&path, config::FileFormat::Toml).required(required))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .set_override_option("cluster", overrides.cluster.clone())?
            .set_override_option("base_task_definition", overrides.base_task_definition.clone())?
            .set_override_option("subnet", overrides.subnet.clone())?
            .set_override_option("security_group", overrides.security_group.clone())?
            .set_override_option("study_id", overrides.study_id.clone())?
            .set_override_option("study_image", overrides.study_image.clone())?
            .set_override_option("region", overrides.region.clone())?
            .set_override_option("timeout_secs", overrides.timeout_secs)?
            .build()
            .with_context(|| format!("Failed to read configuration ({})", path))?;

        settings
            .try_deserialize()
            .context("Invalid launcher configuration")
    }

    /// Validated launch request (every field non-empty)
    pub fn to_request(&self) -> std::result::Result<StudyLaunchRequest, DomainError> {
        StudyLaunchRequest::new(
            self.study_id.clone(),
            self.study_image.clone(),
            self.cluster.clone(),
            self.base_task_definition.clone(),
            self.subnet.clone(),
            self.security_group.clone(),
        )
    }

    pub fn study_id(&self) -> std::result::Result<StudyId, DomainError> {
        StudyId::new(self.study_id.clone())
    }

    pub fn call_options(&self) -> CallOptions {
        match self.timeout_secs {
            Some(secs) => CallOptions::new().with_timeout(Duration::from_secs(secs)),
            None => CallOptions::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("enclave_launcher_{}.toml", name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    const FULL: &str = r#"
cluster = "research-cluster"
base_task_definition = "ResearchContainerTaskDef"
subnet = "subnet-015f"
security_group = "sg-037f"
study_id = "study-3"
study_image = "research-app:v1"
timeout_secs = 30
"#;

    #[test]
    fn test_load_file_into_request() {
        let path = write_config("full", FULL);

        let config = LauncherConfig::load(Some(&path), &Overrides::default()).unwrap();
        let request = config.to_request().unwrap();

        assert_eq!(request.cluster, "research-cluster");
        assert_eq!(request.study_id.as_str(), "study-3");
        assert_eq!(config.call_options().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_flags_override_file() {
        let path = write_config("override", FULL);
        let overrides = Overrides {
            study_id: Some("study-4".to_string()),
            study_image: Some("research-app:v2".to_string()),
            ..Default::default()
        };

        let config = LauncherConfig::load(Some(&path), &overrides).unwrap();

        assert_eq!(config.study_id, "study-4");
        assert_eq!(config.study_image, "research-app:v2");
        assert_eq!(config.subnet, "subnet-015f");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = LauncherConfig::load(
            Some("/nonexistent/enclave/launcher.toml"),
            &Overrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_incomplete_config_fails_validation() {
        let config = LauncherConfig {
            study_id: "study-3".to_string(),
            ..Default::default()
        };

        assert!(config.study_id().is_ok());
        assert_eq!(
            config.to_request().unwrap_err(),
            DomainError::MissingField("study_image")
        );
    }

    #[test]
    fn test_no_timeout_means_unbounded() {
        assert!(LauncherConfig::default().call_options().timeout.is_none());
    }
}
