use std::fmt;

use crate::error::{GitLabMcpError, Result};

/// GitLab personal or project access token.
///
/// `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Builds a token from user input, rejecting blank values.
    ///
    /// # Errors
    ///
    /// Returns `GitLabMcpError::Config` if the token is empty after trimming.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(GitLabMcpError::Config(
                "GitLab token cannot be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let token = Token::parse("  glpat-abc \n").unwrap();
        assert_eq!(token.as_str(), "glpat-abc");
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert!(Token::parse("   ").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let token = Token::parse("glpat-secret").unwrap();
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.to_string(), "***");
    }
}
