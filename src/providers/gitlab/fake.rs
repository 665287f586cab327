//! In-memory GitLab used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::api::{GitLabApi, Page, PageRequest, PipelineQuery};
use super::cancel::CancelToken;
use super::types::{GitLabGroup, GitLabPipeline, GitLabProject};
use crate::error::{GitLabMcpError, Result};
use crate::resources::ProjectDetails;

#[derive(Default)]
pub struct FakeGitLab {
    groups: Vec<GitLabGroup>,
    projects: HashMap<u64, Vec<GitLabProject>>,
    failing_project_listings: HashSet<u64>,
    cancel_after_project_listings: Option<(usize, CancelToken)>,
    failing_descendant_listing: bool,
    pipelines: Vec<GitLabPipeline>,
    honor_created_before: bool,
    failing_pipeline_page: Option<u32>,
    failing_deletes: HashSet<u64>,
    cancel_after_deletes: Option<(usize, CancelToken)>,
    page_size: Option<usize>,
    calls: Mutex<Vec<String>>,
}

pub fn group(id: u64, full_path: &str, parent_id: Option<u64>) -> GitLabGroup {
    let path = full_path.rsplit('/').next().unwrap_or(full_path).to_string();
    GitLabGroup {
        id,
        name: path.clone(),
        path,
        full_path: full_path.to_string(),
        web_url: format!("https://gitlab.example.com/groups/{full_path}"),
        parent_id,
    }
}

pub fn project(id: u64, namespace: &str, path: &str, archived: bool) -> GitLabProject {
    GitLabProject {
        id,
        name: path.to_string(),
        path: path.to_string(),
        path_with_namespace: format!("{namespace}/{path}"),
        web_url: format!("https://gitlab.example.com/{namespace}/{path}"),
        http_url_to_repo: format!("https://gitlab.example.com/{namespace}/{path}.git"),
        archived,
    }
}

pub fn pipeline(id: u64, created_at: Option<DateTime<Utc>>) -> GitLabPipeline {
    GitLabPipeline {
        id,
        iid: id,
        project_id: 42,
        status: "success".to_string(),
        source: "push".to_string(),
        ref_: "main".to_string(),
        sha: format!("{id:040x}"),
        web_url: format!("https://gitlab.example.com/acme/api/-/pipelines/{id}"),
        created_at,
        updated_at: created_at,
    }
}

impl FakeGitLab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group; `parent_id` links it into the hierarchy.
    pub fn with_group(mut self, group: GitLabGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_projects(mut self, group_id: u64, projects: Vec<GitLabProject>) -> Self {
        self.projects.entry(group_id).or_default().extend(projects);
        self
    }

    pub fn failing_projects_for(mut self, group_id: u64) -> Self {
        self.failing_project_listings.insert(group_id);
        self
    }

    /// Fires `token` once `count` project listings have been requested.
    pub fn cancel_after_project_listings(mut self, count: usize, token: CancelToken) -> Self {
        self.cancel_after_project_listings = Some((count, token));
        self
    }

    pub fn failing_descendant_listing(mut self) -> Self {
        self.failing_descendant_listing = true;
        self
    }

    pub fn with_pipelines(mut self, pipelines: Vec<GitLabPipeline>) -> Self {
        self.pipelines = pipelines;
        self
    }

    /// Applies `created_before` server-side instead of ignoring it.
    pub fn honoring_created_before(mut self) -> Self {
        self.honor_created_before = true;
        self
    }

    /// Fails the pipeline listing when `page` is requested.
    pub fn failing_pipeline_page(mut self, page: u32) -> Self {
        self.failing_pipeline_page = Some(page);
        self
    }

    pub fn failing_delete(mut self, pipeline_id: u64) -> Self {
        self.failing_deletes.insert(pipeline_id);
        self
    }

    /// Fires `token` once `count` deletions have been attempted.
    pub fn cancel_after_deletes(mut self, count: usize, token: CancelToken) -> Self {
        self.cancel_after_deletes = Some((count, token));
        self
    }

    /// Splits every listing into pages of `size` items.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.calls()
            .iter()
            .filter_map(|call| call.strip_prefix("delete_pipeline "))
            .filter_map(|id| id.parse().ok())
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn paginate<T: Clone>(&self, items: &[T], request: PageRequest) -> Page<T> {
        let size = self.page_size.unwrap_or(request.per_page as usize);
        let start = (request.page as usize - 1) * size;
        let end = (start + size).min(items.len());
        let slice = if start < items.len() { &items[start..end] } else { &[] };
        Page {
            items: slice.to_vec(),
            next_page: (end < items.len()).then_some(request.page + 1),
        }
    }

    fn not_found(what: &str) -> GitLabMcpError {
        GitLabMcpError::Api {
            status: 404,
            message: format!("404 {what} Not Found"),
        }
    }

    fn is_descendant(&self, candidate: &GitLabGroup, ancestor_id: u64) -> bool {
        let mut parent = candidate.parent_id;
        while let Some(id) = parent {
            if id == ancestor_id {
                return true;
            }
            parent = self.groups.iter().find(|g| g.id == id).and_then(|g| g.parent_id);
        }
        false
    }
}

impl GitLabApi for FakeGitLab {
    async fn get_group(&self, group_id_or_path: &str) -> Result<GitLabGroup> {
        self.record(format!("get_group {group_id_or_path}"));
        self.groups
            .iter()
            .find(|g| g.full_path == group_id_or_path || g.id.to_string() == group_id_or_path)
            .cloned()
            .ok_or_else(|| Self::not_found("Group"))
    }

    async fn list_group_projects(
        &self,
        group_id: u64,
        page: PageRequest,
        archived: Option<bool>,
    ) -> Result<Page<GitLabProject>> {
        self.record(format!(
            "list_group_projects {group_id} page={} archived={archived:?}",
            page.page
        ));

        if let Some((count, token)) = &self.cancel_after_project_listings {
            let listings = self
                .calls()
                .iter()
                .filter(|call| call.starts_with("list_group_projects "))
                .count();
            if listings >= *count {
                token.cancel();
            }
        }

        if self.failing_project_listings.contains(&group_id) {
            return Err(GitLabMcpError::Api {
                status: 403,
                message: "403 Forbidden".to_string(),
            });
        }
        let projects: Vec<GitLabProject> = self
            .projects
            .get(&group_id)
            .into_iter()
            .flatten()
            .filter(|p| archived.map_or(true, |wanted| p.archived == wanted))
            .cloned()
            .collect();
        Ok(self.paginate(&projects, page))
    }

    async fn list_descendant_groups(
        &self,
        group_id: u64,
        page: PageRequest,
    ) -> Result<Page<GitLabGroup>> {
        self.record(format!("list_descendant_groups {group_id} page={}", page.page));
        if self.failing_descendant_listing {
            return Err(GitLabMcpError::Api {
                status: 500,
                message: "500 Internal Server Error".to_string(),
            });
        }
        let descendants: Vec<GitLabGroup> = self
            .groups
            .iter()
            .filter(|g| self.is_descendant(g, group_id))
            .cloned()
            .collect();
        Ok(self.paginate(&descendants, page))
    }

    async fn list_subgroups(&self, group_id: u64, page: PageRequest) -> Result<Page<GitLabGroup>> {
        self.record(format!("list_subgroups {group_id} page={}", page.page));
        let children: Vec<GitLabGroup> = self
            .groups
            .iter()
            .filter(|g| g.parent_id == Some(group_id))
            .cloned()
            .collect();
        Ok(self.paginate(&children, page))
    }

    async fn list_project_pipelines(
        &self,
        project_id_or_path: &str,
        page: PageRequest,
        query: PipelineQuery,
    ) -> Result<Page<GitLabPipeline>> {
        self.record(format!(
            "list_project_pipelines {project_id_or_path} page={} before={}",
            page.page,
            query.created_before.map(|c| c.to_rfc3339()).unwrap_or_default()
        ));
        if self.failing_pipeline_page == Some(page.page) {
            return Err(GitLabMcpError::Api {
                status: 502,
                message: "502 Bad Gateway".to_string(),
            });
        }
        let pipelines: Vec<GitLabPipeline> = self
            .pipelines
            .iter()
            .filter(|p| {
                !self.honor_created_before
                    || match (p.created_at, query.created_before) {
                        (Some(created), Some(before)) => created < before,
                        _ => true,
                    }
            })
            .cloned()
            .collect();
        Ok(self.paginate(&pipelines, page))
    }

    async fn delete_pipeline(&self, project_id_or_path: &str, pipeline_id: u64) -> Result<()> {
        self.record(format!("delete_pipeline {pipeline_id}"));
        let _ = project_id_or_path;

        if let Some((count, token)) = &self.cancel_after_deletes {
            if self.deleted().len() >= *count {
                token.cancel();
            }
        }

        if self.failing_deletes.contains(&pipeline_id) {
            return Err(GitLabMcpError::Api {
                status: 500,
                message: "delete failed".to_string(),
            });
        }
        Ok(())
    }

    async fn archive_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        self.record(format!("archive_project {project_id_or_path}"));
        let mut details = self.get_project(project_id_or_path).await?;
        details.archived = true;
        Ok(details)
    }

    async fn get_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        self.record(format!("get_project {project_id_or_path}"));
        let project = self
            .projects
            .values()
            .flatten()
            .find(|p| {
                p.path_with_namespace == project_id_or_path || p.id.to_string() == project_id_or_path
            })
            .ok_or_else(|| Self::not_found("Project"))?;

        Ok(ProjectDetails {
            id: project.id,
            name: project.name.clone(),
            path: project.path.clone(),
            path_with_namespace: project.path_with_namespace.clone(),
            description: None,
            web_url: project.web_url.clone(),
            clone_url_http: Some(project.http_url_to_repo.clone()),
            clone_url_ssh: None,
            visibility: Some("private".to_string()),
            archived: project.archived,
            created_at: None,
            last_activity_at: None,
            default_branch: Some("main".to_string()),
            forks_count: 0,
            star_count: 0,
            open_issues_count: None,
            topics: Vec::new(),
            readme_url: None,
            namespace: None,
            statistics: None,
        })
    }
}
