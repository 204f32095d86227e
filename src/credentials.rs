// Credential handling for the GitHub REST API.
// Accepts a pre-issued token, falling back to the token the gh CLI is logged in with.

use anyhow::{Context, Result};
use std::process::Command;

/// Credentials needed to talk to GitHub.
#[derive(Clone)]
pub struct Credentials {
    pub github_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .finish()
    }
}

/// Trait for obtaining credentials, allowing test implementations.
pub trait CredentialProvider {
    fn get_credentials(&self) -> Result<Credentials>;
}

/// Real credential provider: an explicit token (flag or `GITHUB_TOKEN`) wins,
/// otherwise the token from `gh auth token` is used.
pub struct RealCredentialProvider {
    pub token: Option<String>,
}

impl CredentialProvider for RealCredentialProvider {
    fn get_credentials(&self) -> Result<Credentials> {
        if let Some(token) = non_empty(self.token.as_deref()) {
            return Ok(Credentials {
                github_token: token.to_string(),
            });
        }

        let github_token = token_from_gh()?;
        Ok(Credentials { github_token })
    }
}

fn non_empty(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|t| !t.is_empty())
}

/// Read the gh CLI's token by running `gh auth token`.
fn token_from_gh() -> Result<String> {
    let output = Command::new("gh")
        .args(["auth", "token"])
        .output()
        .context("No GitHub token given and failed to run 'gh auth token'. Set GITHUB_TOKEN or install the GitHub CLI.")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "GitHub CLI not authenticated: {}. Run 'gh auth login' or set GITHUB_TOKEN.",
            stderr.trim()
        );
    }

    parse_gh_token(&String::from_utf8_lossy(&output.stdout))
}

fn parse_gh_token(stdout: &str) -> Result<String> {
    non_empty(Some(stdout))
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("'gh auth token' printed an empty token"))
}
