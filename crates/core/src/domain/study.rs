// Study Domain Model

use super::error::{DomainError, Result};
use super::task_definition::Tag;
use super::STUDY_TAG_KEY;
use serde::{Deserialize, Serialize};

/// Study identifier (opaque, non-empty)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyId(String);

impl StudyId {
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(DomainError::MissingField("study_id"));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `studyId=<value>` tag attached to every resource of this study
    pub fn tag(&self) -> Tag {
        Tag::new(STUDY_TAG_KEY, self.0.clone())
    }
}

impl std::fmt::Display for StudyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything needed to launch one study
///
/// Constructed once by the configuration layer and threaded by reference
/// through derive and launch. All fields are opaque platform identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyLaunchRequest {
    pub study_id: StudyId,
    pub study_image: String,
    pub cluster: String,
    pub base_task_definition: String,
    pub subnet: String,
    pub security_group: String,
}

impl StudyLaunchRequest {
    /// Build a request, rejecting any empty field
    pub fn new(
        study_id: impl Into<String>,
        study_image: impl Into<String>,
        cluster: impl Into<String>,
        base_task_definition: impl Into<String>,
        subnet: impl Into<String>,
        security_group: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            study_id: StudyId::new(study_id)?,
            study_image: non_empty("study_image", study_image.into())?,
            cluster: non_empty("cluster", cluster.into())?,
            base_task_definition: non_empty("base_task_definition", base_task_definition.into())?,
            subnet: non_empty("subnet", subnet.into())?,
            security_group: non_empty("security_group", security_group.into())?,
        })
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        Err(DomainError::MissingField(field))
    } else {
        Ok(value)
    }
}
