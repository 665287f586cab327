use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A group or subgroup as returned by the REST API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitLabGroup {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub full_path: String,
    #[serde(default)]
    pub web_url: String,
    /// Absent for top-level groups
    #[serde(default)]
    pub parent_id: Option<u64>,
}

/// A project entry from a group project listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitLabProject {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub path_with_namespace: String,
    #[serde(default)]
    pub web_url: String,
    /// HTTPS clone URL
    #[serde(default)]
    pub http_url_to_repo: String,
    #[serde(default)]
    pub archived: bool,
}

/// A pipeline entry from a project pipeline listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitLabPipeline {
    pub id: u64,
    #[serde(default)]
    pub iid: u64,
    #[serde(default)]
    pub project_id: u64,
    #[serde(default)]
    pub status: String,
    /// Trigger source (e.g., "push", "schedule", "web")
    #[serde(default)]
    pub source: String,
    #[serde(rename = "ref", default)]
    pub ref_: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
