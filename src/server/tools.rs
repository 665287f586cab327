use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc};
use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::protocol::tool_result;
use super::{McpServer, SERVER_VERSION};
use crate::error::{GitLabMcpError, Result};
use crate::providers::gitlab::{CancelToken, GitLabApi};
use crate::resources::{PipelineDeletionError, PipelineDeletionSummary};

#[derive(Debug, Clone, Copy)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
}

pub const TOOLS: &[ToolInfo] = &[
    ToolInfo {
        name: "health_check",
        description: "Simple health check to verify the MCP server is working",
    },
    ToolInfo {
        name: "list_all_group_projects",
        description: "List all projects in a group and its subgroups recursively",
    },
    ToolInfo {
        name: "list_direct_group_projects",
        description: "List all projects directly in a group (not including subgroups)",
    },
    ToolInfo {
        name: "list_subgroups",
        description: "List all subgroups in a group",
    },
    ToolInfo {
        name: "archive_project",
        description: "Archive a GitLab project (requires Owner role or admin permissions)",
    },
    ToolInfo {
        name: "get_project_status",
        description: "Get detailed status and metadata for a single GitLab project",
    },
    ToolInfo {
        name: "list_old_pipelines",
        description: "List all pipelines in a project older than the provided age threshold",
    },
    ToolInfo {
        name: "delete_old_pipelines",
        description: "Delete all pipelines in a project older than the provided age threshold",
    },
];

const GROUP_ARG: &str = "group_id_or_path";
const PROJECT_ARG: &str = "project_id_or_path";
const YEARS_ARG: &str = "older_than_years";

fn input_schema(tool: &str) -> Value {
    let group = json!({ "type": "string", "description": "GitLab group ID or path" });
    let project =
        json!({ "type": "string", "description": "GitLab project ID or path with namespace" });

    match tool {
        "list_all_group_projects" => json!({
            "type": "object",
            "properties": {
                GROUP_ARG: group,
                "archived": {
                    "type": "boolean",
                    "description": "Filter by archived status (default: false)"
                }
            },
            "required": [GROUP_ARG]
        }),
        "list_direct_group_projects" | "list_subgroups" => json!({
            "type": "object",
            "properties": { GROUP_ARG: group },
            "required": [GROUP_ARG]
        }),
        "archive_project" | "get_project_status" => json!({
            "type": "object",
            "properties": { PROJECT_ARG: project },
            "required": [PROJECT_ARG]
        }),
        "list_old_pipelines" => json!({
            "type": "object",
            "properties": {
                PROJECT_ARG: project,
                YEARS_ARG: {
                    "type": "number",
                    "description": "Age threshold in years; pipelines created before this many years ago will be included"
                }
            },
            "required": [PROJECT_ARG, YEARS_ARG]
        }),
        "delete_old_pipelines" => json!({
            "type": "object",
            "properties": {
                PROJECT_ARG: project,
                YEARS_ARG: {
                    "type": "number",
                    "description": "Age threshold in years; pipelines created before this many years ago will be deleted"
                },
                "confirm": {
                    "type": "boolean",
                    "description": "Set to true to actually delete pipelines; defaults to false for safety"
                }
            },
            "required": [PROJECT_ARG, YEARS_ARG]
        }),
        _ => json!({ "type": "object", "properties": {} }),
    }
}

/// Tool descriptors as advertised by `tools/list`.
pub fn tool_definitions() -> Vec<Value> {
    TOOLS
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": input_schema(tool.name),
            })
        })
        .collect()
}

fn require_string(args: &Value, key: &str) -> Result<String> {
    match args.get(key) {
        Some(Value::String(value)) => {
            let value = value.trim();
            if value.is_empty() {
                Err(GitLabMcpError::InvalidInput(format!("{key} cannot be empty")))
            } else {
                Ok(value.to_string())
            }
        }
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(_) => Err(GitLabMcpError::InvalidInput(format!(
            "{key} must be a string"
        ))),
        None => Err(GitLabMcpError::InvalidInput(format!("{key} is required"))),
    }
}

fn optional_bool(args: &Value, key: &str) -> Result<bool> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(GitLabMcpError::InvalidInput(format!(
            "{key} must be a boolean"
        ))),
    }
}

/// Reads `older_than_years` as a positive whole number.
fn require_years(args: &Value) -> Result<u32> {
    let value = args
        .get(YEARS_ARG)
        .ok_or_else(|| GitLabMcpError::InvalidInput(format!("{YEARS_ARG} is required")))?;

    let years = value
        .as_f64()
        .ok_or_else(|| GitLabMcpError::InvalidInput(format!("{YEARS_ARG} must be a number")))?;

    if years <= 0.0 {
        return Err(GitLabMcpError::InvalidInput(format!(
            "{YEARS_ARG} must be greater than zero"
        )));
    }
    if years.fract() != 0.0 || years > f64::from(u32::MAX / 12) {
        return Err(GitLabMcpError::InvalidInput(format!(
            "{YEARS_ARG} must be a whole number of years"
        )));
    }

    Ok(years as u32)
}

/// `now` minus `years` calendar years, keeping the time of day.
///
/// Feb 29 rolls over to Mar 1 when the target year is not a leap year.
pub fn cutoff_from_years(now: DateTime<Utc>, years: u32) -> Result<DateTime<Utc>> {
    let too_large = || GitLabMcpError::InvalidInput(format!("{YEARS_ARG} is too large: {years}"));

    let year = i32::try_from(years)
        .ok()
        .and_then(|years| now.year().checked_sub(years))
        .ok_or_else(too_large)?;
    let date = NaiveDate::from_ymd_opt(year, now.month(), now.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
        .ok_or_else(too_large)?;

    Ok(date.and_time(now.time()).and_utc())
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Serialize)]
struct HealthReport<'a> {
    status: &'static str,
    timestamp: String,
    server: &'a str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ArchiveReport {
    success: bool,
    project_id: u64,
    project_name: String,
    project_path: String,
    archived: bool,
    web_url: String,
    archived_timestamp: String,
}

#[derive(Debug, Serialize)]
struct DeletionReport<'a> {
    project: &'a str,
    cutoff: String,
    older_than_years: u32,
    total_candidates: usize,
    deleted_count: usize,
    deleted_ids: &'a [u64],
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_deletions: Option<&'a [PipelineDeletionError]>,
}

impl<'a> DeletionReport<'a> {
    fn new(
        project: &'a str,
        cutoff: DateTime<Utc>,
        years: u32,
        summary: &'a PipelineDeletionSummary,
    ) -> Self {
        Self {
            project,
            cutoff: rfc3339(cutoff),
            older_than_years: years,
            total_candidates: summary.total_candidates,
            deleted_count: summary.deleted_ids.len(),
            deleted_ids: &summary.deleted_ids,
            failed_deletions: (!summary.failed.is_empty()).then_some(summary.failed.as_slice()),
        }
    }
}

fn error_prefix(tool: &str) -> &'static str {
    match tool {
        "list_all_group_projects" => "Error fetching projects",
        "list_direct_group_projects" => "Error fetching direct projects",
        "list_subgroups" => "Error fetching subgroups",
        "archive_project" => "Error archiving project",
        "get_project_status" => "Error fetching project",
        "list_old_pipelines" => "Error listing old pipelines",
        "delete_old_pipelines" => "Error deleting old pipelines",
        _ => "Error",
    }
}

fn error_text(tool: &str, error: &GitLabMcpError) -> String {
    match error {
        GitLabMcpError::InvalidInput(message) => message.clone(),
        GitLabMcpError::Cancelled {
            partial: Some(summary),
        } => {
            let partial = serde_json::to_string_pretty(summary).unwrap_or_default();
            format!(
                "Pipeline deletion cancelled after {} of {} candidates:\n\n{partial}",
                summary.deleted_ids.len() + summary.failed.len(),
                summary.total_candidates
            )
        }
        GitLabMcpError::Cancelled { partial: None } => "Request cancelled".to_string(),
        other if other.status() == Some(403) => format!(
            "{}: {other} (the access token lacks permission for this operation)",
            error_prefix(tool)
        ),
        other => format!("{}: {other}", error_prefix(tool)),
    }
}

impl<A: GitLabApi + 'static> McpServer<A> {
    /// Runs one tool and wraps its outcome as a `tools/call` result.
    pub(super) async fn call_tool(&self, name: &str, args: &Value, cancel: &CancelToken) -> Value {
        let empty = Value::Object(Map::new());
        let args = if args.is_object() { args } else { &empty };

        let outcome = match name {
            "health_check" => self.health_check(),
            "list_all_group_projects" => self.list_all_group_projects(args, cancel).await,
            "list_direct_group_projects" => self.list_direct_group_projects(args, cancel).await,
            "list_subgroups" => self.list_subgroups(args, cancel).await,
            "archive_project" => self.archive_project(args).await,
            "get_project_status" => self.get_project_status(args).await,
            "list_old_pipelines" => self.list_old_pipelines(args, cancel).await,
            "delete_old_pipelines" => self.delete_old_pipelines(args, cancel).await,
            _ => Err(GitLabMcpError::InvalidInput(format!("Unknown tool: {name}"))),
        };

        match outcome {
            Ok(text) => tool_result(&text, false),
            Err(e) => {
                warn!("Tool {name} failed: {e}");
                tool_result(&error_text(name, &e), true)
            }
        }
    }

    fn health_check(&self) -> Result<String> {
        let report = HealthReport {
            status: "healthy",
            timestamp: rfc3339(Utc::now()),
            server: &self.name,
            version: SERVER_VERSION,
        };
        Ok(format!(
            "Health check successful: {}",
            serde_json::to_string(&report)?
        ))
    }

    async fn list_all_group_projects(&self, args: &Value, cancel: &CancelToken) -> Result<String> {
        let group = require_string(args, GROUP_ARG)?;
        let archived = optional_bool(args, "archived")?;

        let listing = self
            .provider
            .list_all_projects(&group, archived, cancel)
            .await?;

        let status = if archived { "archived" } else { "all" };
        let mut text = format!(
            "Found {} {status} projects in group {group} and its subgroups:\n\n{}",
            listing.projects.len(),
            serde_json::to_string_pretty(&listing.projects)?
        );

        if !listing.skipped_subgroups.is_empty() {
            text.push_str(&format!(
                "\n\nSkipped {} subgroups that could not be listed:\n\n{}",
                listing.skipped_subgroups.len(),
                serde_json::to_string_pretty(&listing.skipped_subgroups)?
            ));
        }

        Ok(text)
    }

    async fn list_direct_group_projects(
        &self,
        args: &Value,
        cancel: &CancelToken,
    ) -> Result<String> {
        let group = require_string(args, GROUP_ARG)?;
        let projects = self.provider.list_direct_projects(&group, cancel).await?;

        Ok(format!(
            "Found {} direct projects in group {group}:\n\n{}",
            projects.len(),
            serde_json::to_string_pretty(&projects)?
        ))
    }

    async fn list_subgroups(&self, args: &Value, cancel: &CancelToken) -> Result<String> {
        let group = require_string(args, GROUP_ARG)?;
        let subgroups = self.provider.list_subgroups(&group, cancel).await?;

        Ok(format!(
            "Found {} subgroups in group {group}:\n\n{}",
            subgroups.len(),
            serde_json::to_string_pretty(&subgroups)?
        ))
    }

    async fn archive_project(&self, args: &Value) -> Result<String> {
        let project = require_string(args, PROJECT_ARG)?;
        let archived = self.provider.archive_project(&project).await?;

        let report = ArchiveReport {
            success: true,
            project_id: archived.id,
            project_name: archived.name,
            project_path: archived.path_with_namespace,
            archived: archived.archived,
            web_url: archived.web_url,
            archived_timestamp: rfc3339(Utc::now()),
        };

        Ok(format!(
            "Project '{}' archived successfully:\n\n{}",
            report.project_path,
            serde_json::to_string_pretty(&report)?
        ))
    }

    async fn get_project_status(&self, args: &Value) -> Result<String> {
        let project = require_string(args, PROJECT_ARG)?;
        let details = self.provider.get_project(&project).await?;

        Ok(format!(
            "Project status for '{}':\n\n{}",
            details.path_with_namespace,
            serde_json::to_string_pretty(&details)?
        ))
    }

    async fn list_old_pipelines(&self, args: &Value, cancel: &CancelToken) -> Result<String> {
        let project = require_string(args, PROJECT_ARG)?;
        let years = require_years(args)?;
        let cutoff = cutoff_from_years(Utc::now(), years)?;

        let pipelines = self
            .provider
            .list_old_pipelines(&project, cutoff, cancel)
            .await?;

        if pipelines.is_empty() {
            return Ok(format!(
                "No pipelines in project {project} are older than {years} years (cutoff {}).",
                rfc3339(cutoff)
            ));
        }

        Ok(format!(
            "Found {} pipelines in project {project} created before {} (older than {years} years):\n\n{}",
            pipelines.len(),
            rfc3339(cutoff),
            serde_json::to_string_pretty(&pipelines)?
        ))
    }

    async fn delete_old_pipelines(&self, args: &Value, cancel: &CancelToken) -> Result<String> {
        let project = require_string(args, PROJECT_ARG)?;
        let years = require_years(args)?;

        if !optional_bool(args, "confirm")? {
            return Ok("Deletion not performed: set confirm=true to delete pipelines after reviewing list_old_pipelines output.".to_string());
        }

        let cutoff = cutoff_from_years(Utc::now(), years)?;
        info!("Deleting pipelines in project {project} created before {cutoff}");

        let summary = self
            .provider
            .delete_old_pipelines(&project, cutoff, cancel)
            .await?;

        if summary.total_candidates == 0 {
            return Ok(format!(
                "No pipelines in project {project} are older than {years} years (cutoff {}).",
                rfc3339(cutoff)
            ));
        }

        let report = DeletionReport::new(&project, cutoff, years, &summary);
        let json = serde_json::to_string_pretty(&report)?;
        let failures = if summary.failed.is_empty() {
            ""
        } else {
            ". Some deletions failed"
        };

        Ok(format!(
            "Deleted {}/{} pipelines older than {years} years in project {project} (cutoff {}){failures}:\n\n{json}",
            summary.deleted_ids.len(),
            summary.total_candidates,
            rfc3339(cutoff)
        ))
    }
}
