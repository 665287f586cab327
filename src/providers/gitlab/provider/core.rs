use crate::error::{GitLabMcpError, Result};
use crate::providers::gitlab::api::GitLabApi;
use crate::providers::gitlab::client::GitLabClient;

/// Traversal and bulk-mutation operations over a GitLab instance.
///
/// Every operation runs its remote calls one after another on the calling
/// task; nothing is cached between calls.
pub struct GitLabProvider<A = GitLabClient> {
    pub(super) api: A,
}

impl<A: GitLabApi> GitLabProvider<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }
}

/// Trims an identifier argument and rejects it when blank.
pub(super) fn require_identifier<'a>(name: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GitLabMcpError::InvalidInput(format!(
            "{name} cannot be empty"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_identifier_trims() {
        assert_eq!(require_identifier("group", "  acme/platform ").unwrap(), "acme/platform");
    }

    #[test]
    fn test_require_identifier_rejects_blank() {
        let err = require_identifier("project_id_or_path", " \t").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: project_id_or_path cannot be empty"
        );
    }
}
