// Discussion target resolution: which repository and pull request to annotate.
// Falls back to the `gh` CLI for auto-detection when flags are not given.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::process::Command;

/// A GitHub repository, fixed for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The pull request whose comments and description are managed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscussionTarget {
    pub repo: RepoRef,
    pub pr_number: u64,
}

impl fmt::Display for DiscussionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.pr_number)
    }
}

/// Trait for detecting the target from the local checkout, allowing test implementations.
pub trait TargetDetector {
    /// Detect the current repo from git context.
    fn detect_repo(&self) -> Result<RepoRef>;

    /// Detect the PR number for the current branch.
    fn detect_pr(&self, repo: &RepoRef) -> Result<u64>;
}

/// Real detector that uses the `gh` CLI.
pub struct GhTargetDetector;

impl TargetDetector for GhTargetDetector {
    fn detect_repo(&self) -> Result<RepoRef> {
        let output = Command::new("gh")
            .args(["repo", "view", "--json", "owner,name"])
            .output()
            .context("Failed to run 'gh repo view'. Is this a git repository?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Failed to detect repository: {}", stderr.trim());
        }

        #[derive(Deserialize)]
        struct GhRepoView {
            owner: GhOwner,
            name: String,
        }

        #[derive(Deserialize)]
        struct GhOwner {
            login: String,
        }

        let view: GhRepoView =
            serde_json::from_slice(&output.stdout).context("Failed to parse gh repo view output")?;

        Ok(RepoRef {
            owner: view.owner.login,
            name: view.name,
        })
    }

    fn detect_pr(&self, _repo: &RepoRef) -> Result<u64> {
        // gh only infers the PR from the current branch when --repo is absent.
        let output = Command::new("gh")
            .args(["pr", "view", "--json", "number"])
            .output()
            .context("Failed to run 'gh pr view'")?;

        if !output.status.success() {
            anyhow::bail!("No PR found for current branch. Create a PR or use --pr flag.");
        }

        #[derive(Deserialize)]
        struct GhPrView {
            number: u64,
        }

        let view: GhPrView =
            serde_json::from_slice(&output.stdout).context("Failed to parse gh pr view output")?;

        Ok(view.number)
    }
}

/// Resolve the discussion target from CLI args and/or auto-detection.
pub fn resolve_target(
    detector: &dyn TargetDetector,
    repo_arg: Option<&str>,
    pr_arg: Option<u64>,
) -> Result<DiscussionTarget> {
    let repo = match repo_arg {
        Some(repo_str) => parse_repo_arg(repo_str)?,
        None => detector.detect_repo()?,
    };

    let pr_number = match pr_arg {
        Some(pr) => pr,
        None => detector.detect_pr(&repo)?,
    };

    Ok(DiscussionTarget { repo, pr_number })
}

/// Parse "owner/repo" format from CLI arg or `GITHUB_REPOSITORY`.
pub fn parse_repo_arg(repo_str: &str) -> Result<RepoRef> {
    match repo_str.trim().split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(RepoRef {
                owner: owner.to_string(),
                name: name.to_string(),
            })
        }
        _ => anyhow::bail!("Invalid repo format '{}'. Expected 'owner/repo'.", repo_str),
    }
}
