use super::core::GitLabClient;
use crate::error::Result;
use crate::providers::gitlab::api::{Page, PageRequest};
use crate::providers::gitlab::types::{GitLabGroup, GitLabProject};

impl GitLabClient {
    pub async fn fetch_group(&self, group_id_or_path: &str) -> Result<GitLabGroup> {
        let url = self.endpoint(&["groups", group_id_or_path])?;
        self.get_json(url, &[("with_projects", "false".to_string())])
            .await
    }

    pub async fn fetch_group_projects(
        &self,
        group_id: u64,
        page: PageRequest,
        archived: Option<bool>,
    ) -> Result<Page<GitLabProject>> {
        let id = group_id.to_string();
        let url = self.endpoint(&["groups", &id, "projects"])?;

        let mut filters = Vec::new();
        if let Some(archived) = archived {
            filters.push(("archived", archived.to_string()));
        }

        self.get_page(url, page, filters).await
    }

    pub async fn fetch_descendant_groups(
        &self,
        group_id: u64,
        page: PageRequest,
    ) -> Result<Page<GitLabGroup>> {
        let id = group_id.to_string();
        let url = self.endpoint(&["groups", &id, "descendant_groups"])?;
        self.get_page(url, page, Vec::new()).await
    }

    pub async fn fetch_subgroups(
        &self,
        group_id: u64,
        page: PageRequest,
    ) -> Result<Page<GitLabGroup>> {
        let id = group_id.to_string();
        let url = self.endpoint(&["groups", &id, "subgroups"])?;
        self.get_page(url, page, Vec::new()).await
    }
}
