use chrono::SecondsFormat;
use reqwest::Method;

use super::core::GitLabClient;
use crate::error::Result;
use crate::providers::gitlab::api::{Page, PageRequest, PipelineQuery};
use crate::providers::gitlab::types::GitLabPipeline;

impl GitLabClient {
    pub async fn fetch_project_pipelines(
        &self,
        project_id_or_path: &str,
        page: PageRequest,
        query: PipelineQuery,
    ) -> Result<Page<GitLabPipeline>> {
        let url = self.endpoint(&["projects", project_id_or_path, "pipelines"])?;

        // Pipeline IDs are assigned in creation order
        let mut filters = vec![("order_by", "id".to_string()), ("sort", "asc".to_string())];
        if let Some(before) = query.created_before {
            filters.push((
                "created_before",
                before.to_rfc3339_opts(SecondsFormat::Secs, true),
            ));
        }

        self.get_page(url, page, filters).await
    }

    pub async fn remove_pipeline(&self, project_id_or_path: &str, pipeline_id: u64) -> Result<()> {
        let id = pipeline_id.to_string();
        let url = self.endpoint(&["projects", project_id_or_path, "pipelines", &id])?;
        self.send(Method::DELETE, url, &[]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;

    use super::super::core::tests::test_client;
    use super::*;
    use crate::error::GitLabMcpError;

    #[tokio::test]
    async fn test_fetch_project_pipelines_sends_filters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/projects/group%2Fproject/pipelines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("created_before".into(), "2023-10-19T00:00:00Z".into()),
                Matcher::UrlEncoded("order_by".into(), "id".into()),
                Matcher::UrlEncoded("sort".into(), "asc".into()),
                Matcher::UrlEncoded("per_page".into(), "100".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-next-page", "2")
            .with_body(
                r#"[{"id": 101, "iid": 1, "project_id": 999, "status": "success", "source": "push",
                     "ref": "main", "sha": "abc123", "web_url": "https://example.com",
                     "created_at": "2020-01-01T00:00:00Z", "updated_at": "2020-01-01T00:05:00Z"}]"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let query = PipelineQuery {
            created_before: Some(Utc.with_ymd_and_hms(2023, 10, 19, 0, 0, 0).unwrap()),
        };
        let page = client
            .fetch_project_pipelines("group/project", PageRequest::first(), query)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.items[0].id, 101);
        assert_eq!(page.items[0].source, "push");
    }

    #[tokio::test]
    async fn test_remove_pipeline_accepts_no_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/v4/projects/group%2Fproject/pipelines/321")
            .with_status(204)
            .create_async()
            .await;

        let client = test_client(&server.url());
        client.remove_pipeline("group/project", 321).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remove_pipeline_surfaces_forbidden() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/api/v4/projects/7/pipelines/1")
            .with_status(403)
            .with_body(r#"{"message":"403 Forbidden"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.remove_pipeline("7", 1).await.unwrap_err();

        assert!(matches!(err, GitLabMcpError::Api { status: 403, .. }));
    }
}
