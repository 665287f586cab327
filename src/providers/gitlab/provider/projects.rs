use log::info;

use super::core::{require_identifier, GitLabProvider};
use crate::error::{Result, ResultExt};
use crate::providers::gitlab::api::GitLabApi;
use crate::resources::ProjectDetails;

impl<A: GitLabApi> GitLabProvider<A> {
    pub async fn get_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        let project = require_identifier("project_id_or_path", project_id_or_path)?;
        self.api.get_project(project).await.operation("get project")
    }

    /// Archives a project; GitLab requires the Owner role for this.
    pub async fn archive_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        let project = require_identifier("project_id_or_path", project_id_or_path)?;
        let archived = self
            .api
            .archive_project(project)
            .await
            .operation("archive project")?;

        info!("Archived project {}", archived.path_with_namespace);
        Ok(archived)
    }
}
