// Tagged Resource Domain Model

use super::task_definition::Tag;
use serde::{Deserialize, Serialize};

/// Resource kinds the existence probe looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Task,
    TaskDefinition,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Task => "task",
            ResourceType::TaskDefinition => "task-definition",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag index query: one key, accepted values, resource type filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagQuery {
    pub key: String,
    pub values: Vec<String>,
    pub resource_types: Vec<ResourceType>,
}

impl TagQuery {
    /// True when the tag list carries `key` with one of the accepted values
    pub fn matches(&self, tags: &[Tag]) -> bool {
        tags.iter()
            .any(|t| t.key == self.key && self.values.iter().any(|v| *v == t.value))
    }
}

/// One resource returned by the tag index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedResource {
    pub arn: String,
    pub tags: Vec<Tag>,
}

/// One page of tag index results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePage {
    pub items: Vec<TaggedResource>,
    /// Absent (or empty) on the last page
    pub next_token: Option<String>,
}

/// Outcome of a fully traversed existence probe
///
/// The tag index is eventually consistent: `exists() == false` shortly
/// after a launch does not mean the launch failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub matched: Vec<TaggedResource>,
    pub pages: usize,
}

impl ProbeReport {
    pub fn exists(&self) -> bool {
        !self.matched.is_empty()
    }
}
