mod core;
mod groups;
mod pipelines;
mod projects;

pub use self::core::{ClientOptions, GitLabClient};

use super::api::{GitLabApi, Page, PageRequest, PipelineQuery};
use super::types::{GitLabGroup, GitLabPipeline, GitLabProject};
use crate::error::Result;
use crate::resources::ProjectDetails;

impl GitLabApi for GitLabClient {
    async fn get_group(&self, group_id_or_path: &str) -> Result<GitLabGroup> {
        self.fetch_group(group_id_or_path).await
    }

    async fn list_group_projects(
        &self,
        group_id: u64,
        page: PageRequest,
        archived: Option<bool>,
    ) -> Result<Page<GitLabProject>> {
        self.fetch_group_projects(group_id, page, archived).await
    }

    async fn list_descendant_groups(
        &self,
        group_id: u64,
        page: PageRequest,
    ) -> Result<Page<GitLabGroup>> {
        self.fetch_descendant_groups(group_id, page).await
    }

    async fn list_subgroups(&self, group_id: u64, page: PageRequest) -> Result<Page<GitLabGroup>> {
        self.fetch_subgroups(group_id, page).await
    }

    async fn list_project_pipelines(
        &self,
        project_id_or_path: &str,
        page: PageRequest,
        query: PipelineQuery,
    ) -> Result<Page<GitLabPipeline>> {
        self.fetch_project_pipelines(project_id_or_path, page, query)
            .await
    }

    async fn delete_pipeline(&self, project_id_or_path: &str, pipeline_id: u64) -> Result<()> {
        self.remove_pipeline(project_id_or_path, pipeline_id).await
    }

    async fn archive_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        self.post_archive_project(project_id_or_path).await
    }

    async fn get_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        self.fetch_project(project_id_or_path).await
    }
}
