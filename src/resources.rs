use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project as returned to tool callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    pub web_url: String,
    pub clone_url: String,
    /// Path of the group the project was listed from
    pub group_path: String,
    pub is_subgroup_project: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup_full_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgroup {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub full_path: String,
    pub web_url: String,
    pub parent_id: u64,
}

/// A subgroup whose projects could not be listed during a hierarchy walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSubgroup {
    pub full_path: String,
    pub error: String,
}

/// Result of walking a group and all of its descendants.
///
/// Direct projects come first, followed by subgroup projects in the order the
/// subgroups were listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupProjects {
    pub projects: Vec<Project>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_subgroups: Vec<SkippedSubgroup>,
}

/// A pipeline with its derived age.
///
/// Ages are `-1` when the creation time is unknown or lies in the future.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: u64,
    pub iid: u64,
    pub project_id: u64,
    pub status: String,
    pub source: String,
    #[serde(rename = "ref")]
    pub ref_: String,
    pub sha: String,
    pub web_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub age_days: i64,
    pub age_years: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDeletionError {
    pub pipeline_id: u64,
    pub error: String,
}

/// Outcome of a bulk pipeline deletion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDeletionSummary {
    pub total_candidates: usize,
    pub deleted_ids: Vec<u64>,
    pub failed: Vec<PipelineDeletionError>,
}

impl PipelineDeletionSummary {
    /// True once every candidate has been accounted for as deleted or failed.
    pub fn is_complete(&self) -> bool {
        self.deleted_ids.len() + self.failed.len() == self.total_candidates
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub full_path: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStatistics {
    #[serde(default)]
    pub repository_size: u64,
    #[serde(default)]
    pub commit_count: u64,
    #[serde(default)]
    pub storage_size: u64,
}

/// Full project metadata used by the status and archive operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    #[serde(default)]
    pub description: Option<String>,
    pub web_url: String,
    #[serde(default, rename(deserialize = "http_url_to_repo"))]
    pub clone_url_http: Option<String>,
    #[serde(default, rename(deserialize = "ssh_url_to_repo"))]
    pub clone_url_ssh: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub star_count: u64,
    #[serde(default)]
    pub open_issues_count: Option<u64>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub readme_url: Option<String>,
    #[serde(default)]
    pub namespace: Option<Namespace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ProjectStatistics>,
}
