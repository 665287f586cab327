use std::fmt::Write;

use chrono::{DateTime, Utc};
use comfy_table::Cell;

use super::styling::{cyan, dim, failure, field, heading, ok, warning};
use super::tables::{age_cell, archived_cell, create_table, pipeline_status_cell};
use crate::resources::{
    GroupProjects, PipelineDeletionSummary, PipelineSummary, Project, ProjectDetails, Subgroup,
};

fn timestamp(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string())
}

fn project_table(projects: &[Project]) -> String {
    let mut table = create_table(&["ID", "Project", "Subgroup", "Clone URL"]);
    for project in projects {
        table.add_row(vec![
            Cell::new(project.id),
            Cell::new(&project.path_with_namespace),
            Cell::new(project.subgroup_full_path.as_deref().unwrap_or("-")),
            Cell::new(&project.clone_url),
        ]);
    }
    table.to_string()
}

/// Projects of a group, plus any subgroups that had to be skipped.
pub fn render_group_projects(group: &str, listing: &GroupProjects) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", heading("📦", &format!("Projects in {group}")));

    if listing.projects.is_empty() {
        let _ = writeln!(output, "  {}", warning("No projects found."));
    } else {
        let _ = writeln!(output, "{}", project_table(&listing.projects));
    }

    if !listing.skipped_subgroups.is_empty() {
        let _ = writeln!(
            output,
            "\n{}",
            heading("⚠️", "Skipped subgroups")
        );
        for skipped in &listing.skipped_subgroups {
            let _ = writeln!(
                output,
                "  {} {}",
                warning(&skipped.full_path),
                dim(&skipped.error)
            );
        }
    }

    output
}

pub fn render_subgroups(group: &str, subgroups: &[Subgroup]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", heading("🗂️", &format!("Subgroups of {group}")));

    if subgroups.is_empty() {
        let _ = writeln!(output, "  {}", warning("No subgroups found."));
        return output;
    }

    let mut table = create_table(&["ID", "Full path", "Name", "URL"]);
    for subgroup in subgroups {
        table.add_row(vec![
            Cell::new(subgroup.id),
            Cell::new(&subgroup.full_path),
            Cell::new(&subgroup.name),
            Cell::new(&subgroup.web_url),
        ]);
    }
    let _ = writeln!(output, "{table}");
    output
}

pub fn render_pipelines(project: &str, cutoff: DateTime<Utc>, pipelines: &[PipelineSummary]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{}",
        heading("🕰️", &format!("Pipelines in {project} created before {}", cutoff.format("%Y-%m-%d")))
    );

    if pipelines.is_empty() {
        let _ = writeln!(output, "  {}", ok("No pipelines older than the cutoff."));
        return output;
    }

    let mut table = create_table(&["ID", "Ref", "Status", "Created", "Age"]);
    for pipeline in pipelines {
        table.add_row(vec![
            Cell::new(pipeline.id),
            Cell::new(&pipeline.ref_),
            pipeline_status_cell(&pipeline.status),
            Cell::new(timestamp(pipeline.created_at)),
            age_cell(pipeline.age_years),
        ]);
    }
    let _ = writeln!(output, "{table}");
    let _ = writeln!(output, "{}", field("Total", warning(pipelines.len())));
    output
}

pub fn render_deletion(project: &str, summary: &PipelineDeletionSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", heading("🧹", &format!("Pipeline cleanup in {project}")));
    let _ = writeln!(output, "{}", field("Candidates", summary.total_candidates));
    let _ = writeln!(output, "{}", field("Deleted", ok(summary.deleted_ids.len())));
    if !summary.is_complete() {
        let attempted = summary.deleted_ids.len() + summary.failed.len();
        let _ = writeln!(
            output,
            "{}",
            field("Not attempted", warning(summary.total_candidates - attempted))
        );
    }

    if summary.failed.is_empty() {
        return output;
    }

    let _ = writeln!(output, "{}", field("Failed", failure(summary.failed.len())));
    let mut table = create_table(&["Pipeline", "Error"]);
    for failed in &summary.failed {
        table.add_row(vec![Cell::new(failed.pipeline_id), Cell::new(&failed.error)]);
    }
    let _ = writeln!(output, "{table}");
    output
}

pub fn render_project(details: &ProjectDetails) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", heading("📁", &details.path_with_namespace));

    let mut table = create_table(&["Field", "Value"]);
    table.add_row(vec![Cell::new("ID"), Cell::new(details.id)]);
    table.add_row(vec![Cell::new("Status"), archived_cell(details.archived)]);
    table.add_row(vec![
        Cell::new("Visibility"),
        Cell::new(details.visibility.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![
        Cell::new("Default branch"),
        Cell::new(details.default_branch.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![
        Cell::new("Last activity"),
        Cell::new(timestamp(details.last_activity_at)),
    ]);
    table.add_row(vec![Cell::new("Web URL"), Cell::new(&details.web_url)]);
    if let Some(clone_url) = &details.clone_url_http {
        table.add_row(vec![Cell::new("Clone URL"), Cell::new(clone_url)]);
    }
    if let Some(statistics) = &details.statistics {
        table.add_row(vec![Cell::new("Commits"), Cell::new(statistics.commit_count)]);
        table.add_row(vec![
            Cell::new("Repository size"),
            Cell::new(format!("{} bytes", statistics.repository_size)),
        ]);
    }
    let _ = writeln!(output, "{table}");

    if let Some(description) = details.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(output, "  {}", cyan(description));
    }
    output
}
