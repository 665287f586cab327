use reqwest::Method;

use super::core::GitLabClient;
use crate::error::Result;
use crate::resources::ProjectDetails;

impl GitLabClient {
    pub async fn fetch_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        let url = self.endpoint(&["projects", project_id_or_path])?;
        self.get_json(url, &[]).await
    }

    /// Archives a project. Requires the Owner role or administrator access.
    pub async fn post_archive_project(&self, project_id_or_path: &str) -> Result<ProjectDetails> {
        let url = self.endpoint(&["projects", project_id_or_path, "archive"])?;
        let response = self.send(Method::POST, url, &[]).await?;
        Ok(response.json().await?)
    }
}
