use log::{debug, warn};
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::auth::Token;
use crate::error::{GitLabMcpError, Result};
use crate::providers::gitlab::api::{Page, PageRequest};

const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Transport settings for [`GitLabClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// GitLab REST v4 client.
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    token: Option<Token>,
    max_retries: u32,
    retry_delay: Duration,
}

impl GitLabClient {
    pub fn with_options(base_url: &str, token: Option<Token>, options: &ClientOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gitlab-mcp-server/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .build()
            .map_err(|e| GitLabMcpError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Keep any path prefix (e.g. https://example.com/gitlab) when joining.
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let api_url = Url::parse(&base)
            .map_err(|e| GitLabMcpError::Config(format!("Invalid base URL: {e}")))?
            .join("api/v4/")
            .map_err(|e| GitLabMcpError::Config(format!("Invalid API base URL: {e}")))?;

        if api_url.cannot_be_a_base() {
            return Err(GitLabMcpError::Config(format!(
                "Invalid base URL: {base_url}"
            )));
        }

        Ok(Self {
            client,
            api_url,
            token,
            max_retries: options.max_retries,
            retry_delay: options.retry_delay,
        })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    /// Builds an API URL from raw path segments.
    ///
    /// Each segment is percent-encoded on its own, so `group/sub` becomes
    /// `group%2Fsub` as GitLab expects for namespaced identifiers.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| GitLabMcpError::Config(format!("Invalid API URL: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a request, retrying on rate limits, server errors and
    /// connection failures.
    pub(super) async fn send(
        &self,
        method: Method,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<Response> {
        let mut retry_count = 0;
        loop {
            debug!("{method} {url}");
            let request = self.auth_request(
                self.client
                    .request(method.clone(), url.clone())
                    .query(query),
            );

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    if retry_count >= self.max_retries {
                        return Err(e.into());
                    }
                    warn!(
                        "Network error ({}), retrying in {}s ({}/{})...",
                        e,
                        self.retry_delay.as_secs(),
                        retry_count + 1,
                        self.max_retries
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    retry_count += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                if retry_count >= self.max_retries {
                    if self.max_retries == 0 {
                        return Err(api_error(response).await);
                    }
                    return Err(GitLabMcpError::ApiErrorAfterRetries {
                        status: status.as_u16(),
                        retries: self.max_retries,
                    });
                }

                warn!(
                    "GitLab API error (status {status}). Waiting {} seconds before retry {}/{}...",
                    self.retry_delay.as_secs(),
                    retry_count + 1,
                    self.max_retries
                );

                tokio::time::sleep(self.retry_delay).await;
                retry_count += 1;
                continue;
            }

            if !status.is_success() {
                return Err(api_error(response).await);
            }

            return Ok(response);
        }
    }

    pub(super) async fn get_json<T>(&self, url: Url, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(Method::GET, url, query).await?;
        Ok(response.json().await?)
    }

    /// Fetches one page of a listing endpoint.
    pub(super) async fn get_page<T>(
        &self,
        url: Url,
        page: PageRequest,
        filters: Vec<(&str, String)>,
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned,
    {
        let mut query = vec![
            ("per_page", page.per_page.to_string()),
            ("page", page.page.to_string()),
        ];
        query.extend(filters);

        let response = self.send(Method::GET, url, &query).await?;
        let next_page = next_page(&response);
        let items = response.json().await?;

        Ok(Page { items, next_page })
    }
}

fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get(NEXT_PAGE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .filter(|&page| page > 0)
}

async fn api_error(response: Response) -> GitLabMcpError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());
    GitLabMcpError::Api { status, message }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;

    pub fn test_client(base_url: &str) -> GitLabClient {
        let options = ClientOptions {
            timeout: Duration::from_secs(5),
            max_retries: 0,
            retry_delay: Duration::ZERO,
        };
        GitLabClient::with_options(
            base_url,
            Some(Token::parse("test-token").unwrap()),
            &options,
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_encodes_namespaced_paths() {
        let client = test_client("https://gitlab.example.com");
        let url = client.endpoint(&["groups", "acme/platform"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gitlab.example.com/api/v4/groups/acme%2Fplatform"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let client = test_client("https://example.com/gitlab");
        let url = client.endpoint(&["projects", "42"]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/gitlab/api/v4/projects/42");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = GitLabClient::with_options("not a url", None, &ClientOptions::default());
        assert!(matches!(result, Err(GitLabMcpError::Config(_))));
    }

    #[tokio::test]
    async fn test_get_page_reads_next_page_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v4/groups/5/projects")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("per_page".into(), "100".into()),
                mockito::Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-next-page", "2")
            .with_body("[]")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.endpoint(&["groups", "5", "projects"]).unwrap();
        let page: Page<serde_json::Value> =
            client.get_page(url, PageRequest::first(), Vec::new()).await.unwrap();

        mock.assert_async().await;
        assert!(page.items.is_empty());
        assert_eq!(page.next_page, Some(2));
    }

    #[tokio::test]
    async fn test_get_page_treats_empty_next_page_as_last() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/groups/5/projects")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-next-page", "")
            .with_body(r#"[{"id": 1}]"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.endpoint(&["groups", "5", "projects"]).unwrap();
        let page: Page<serde_json::Value> =
            client.get_page(url, PageRequest::at(3), Vec::new()).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_get_page_treats_zero_next_page_as_last() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/groups/5/subgroups")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header("x-next-page", "0")
            .with_body("[]")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.endpoint(&["groups", "5", "subgroups"]).unwrap();
        let page: Page<serde_json::Value> =
            client.get_page(url, PageRequest::first(), Vec::new()).await.unwrap();

        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_non_success_status_maps_to_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v4/groups/missing")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"404 Group Not Found"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let url = client.endpoint(&["groups", "missing"]).unwrap();
        let err = client
            .get_json::<serde_json::Value>(url, &[])
            .await
            .unwrap_err();

        match err {
            GitLabMcpError::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Group Not Found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("GET", "/api/v4/projects/1")
            .with_status(502)
            .expect(3)
            .create_async()
            .await;

        let options = ClientOptions {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_delay: Duration::ZERO,
        };
        let client = GitLabClient::with_options(&server.url(), None, &options).unwrap();
        let url = client.endpoint(&["projects", "1"]).unwrap();
        let err = client
            .get_json::<serde_json::Value>(url, &[])
            .await
            .unwrap_err();

        failing.assert_async().await;
        assert!(matches!(
            err,
            GitLabMcpError::ApiErrorAfterRetries {
                status: 502,
                retries: 2
            }
        ));
    }
}
