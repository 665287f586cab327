use log::{info, warn};

use super::core::{require_identifier, GitLabProvider};
use crate::error::{Result, ResultExt};
use crate::providers::gitlab::api::GitLabApi;
use crate::providers::gitlab::cancel::CancelToken;
use crate::providers::gitlab::pagination::collect_all_pages;
use crate::providers::gitlab::types::{GitLabGroup, GitLabProject};
use crate::resources::{GroupProjects, Project, SkippedSubgroup, Subgroup};

impl<A: GitLabApi> GitLabProvider<A> {
    async fn resolve_group(&self, group_id_or_path: &str) -> Result<GitLabGroup> {
        let group_id_or_path = require_identifier("group_id_or_path", group_id_or_path)?;
        self.api
            .get_group(group_id_or_path)
            .await
            .operation("get group")
    }

    async fn group_projects(
        &self,
        group_id: u64,
        archived: Option<bool>,
        cancel: &CancelToken,
    ) -> Result<Vec<GitLabProject>> {
        let api = &self.api;
        collect_all_pages(cancel, move |page| {
            api.list_group_projects(group_id, page, archived)
        })
        .await
        .operation("list group projects")
    }

    /// Lists every project in a group and in all of its descendant subgroups.
    ///
    /// With `archived_only` the listing is restricted to archived projects;
    /// without it archived and active projects are both returned.
    ///
    /// A subgroup whose projects cannot be listed is logged, reported in
    /// `skipped_subgroups`, and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Fails if the group cannot be resolved, if its direct projects or its
    /// descendant subgroups cannot be listed, or on cancellation.
    pub async fn list_all_projects(
        &self,
        group_id_or_path: &str,
        archived_only: bool,
        cancel: &CancelToken,
    ) -> Result<GroupProjects> {
        let group = self.resolve_group(group_id_or_path).await?;
        let archived = archived_only.then_some(true);

        let direct = self.group_projects(group.id, archived, cancel).await?;
        let mut result = GroupProjects {
            projects: direct
                .into_iter()
                .map(|project| to_project(project, &group.path, None))
                .collect(),
            skipped_subgroups: Vec::new(),
        };

        let api = &self.api;
        let group_id = group.id;
        let descendants = collect_all_pages(cancel, move |page| {
            api.list_descendant_groups(group_id, page)
        })
        .await
        .operation("list descendant groups")?;

        info!(
            "Group {} has {} direct projects and {} descendant subgroups",
            group.full_path,
            result.projects.len(),
            descendants.len()
        );

        for subgroup in descendants {
            cancel.check()?;

            match self.group_projects(subgroup.id, archived, cancel).await {
                Ok(projects) => result.projects.extend(projects.into_iter().map(|project| {
                    to_project(project, &subgroup.path, Some(subgroup.full_path.as_str()))
                })),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!(
                        "Error listing projects for subgroup {}: {e}",
                        subgroup.full_path
                    );
                    result.skipped_subgroups.push(SkippedSubgroup {
                        full_path: subgroup.full_path,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    /// Lists the projects that sit directly in a group, archived or not.
    pub async fn list_direct_projects(
        &self,
        group_id_or_path: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<Project>> {
        let group = self.resolve_group(group_id_or_path).await?;
        let projects = self.group_projects(group.id, None, cancel).await?;

        Ok(projects
            .into_iter()
            .map(|project| to_project(project, &group.path, None))
            .collect())
    }

    /// Lists the immediate child groups of a group (one level only).
    pub async fn list_subgroups(
        &self,
        group_id_or_path: &str,
        cancel: &CancelToken,
    ) -> Result<Vec<Subgroup>> {
        let group = self.resolve_group(group_id_or_path).await?;

        let api = &self.api;
        let group_id = group.id;
        let children = collect_all_pages(cancel, move |page| api.list_subgroups(group_id, page))
            .await
            .operation("list subgroups")?;

        Ok(children
            .into_iter()
            .map(|subgroup| Subgroup {
                id: subgroup.id,
                name: subgroup.name,
                path: subgroup.path,
                full_path: subgroup.full_path,
                web_url: subgroup.web_url,
                parent_id: group.id,
            })
            .collect())
    }
}

fn to_project(project: GitLabProject, group_path: &str, subgroup_full_path: Option<&str>) -> Project {
    Project {
        id: project.id,
        name: project.name,
        path: project.path,
        path_with_namespace: project.path_with_namespace,
        web_url: project.web_url,
        clone_url: project.http_url_to_repo,
        group_path: group_path.to_string(),
        is_subgroup_project: subgroup_full_path.is_some(),
        subgroup_full_path: subgroup_full_path.map(ToString::to_string),
    }
}
