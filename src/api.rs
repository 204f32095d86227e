// GitHub REST API access for comments, review comments and the PR description.
// The client is built once per run with its token and target repository.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use thiserror::Error;

use crate::comment::{
    Anchor, Comment, CommentCategory, GHOST_AUTHOR, InlineDraft, PullRequest,
};
use crate::github::RepoRef;

/// Longest response body excerpt kept in an error message.
const ERROR_BODY_LIMIT: usize = 300;

/// Failure talking to the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint}: credentials rejected (HTTP {status})")]
    Unauthorized { endpoint: String, status: u16 },

    #[error("{endpoint}: rate limited")]
    RateLimited {
        endpoint: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{endpoint}: not found")]
    NotFound { endpoint: String },

    #[error("{endpoint}: HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("{endpoint}: failed to decode response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Remote operations on a single repository's pull requests.
///
/// Implemented over HTTP by [`RestCommentApi`] and in memory for tests.
pub trait CommentApi {
    /// Fetch one page (1-based) of comments in listing order.
    fn list_comments_page(
        &self,
        category: CommentCategory,
        pr_number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>, ApiError>;

    fn create_issue_comment(&self, pr_number: u64, body: &str) -> Result<Comment, ApiError>;

    fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<Comment, ApiError>;

    /// Create a standalone review comment on `commit_id`.
    fn create_review_comment(
        &self,
        pr_number: u64,
        commit_id: &str,
        draft: &InlineDraft,
    ) -> Result<Comment, ApiError>;

    fn update_review_comment(&self, comment_id: u64, body: &str) -> Result<Comment, ApiError>;

    /// Reply inside the thread started by `parent_id`, which must be a root comment.
    fn create_review_reply(
        &self,
        pr_number: u64,
        parent_id: u64,
        body: &str,
    ) -> Result<Comment, ApiError>;

    /// Submit several inline comments at once as a `COMMENT` review.
    fn create_review(
        &self,
        pr_number: u64,
        commit_id: &str,
        drafts: &[InlineDraft],
    ) -> Result<(), ApiError>;

    fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest, ApiError>;

    fn update_pull_request_body(&self, pr_number: u64, body: &str) -> Result<(), ApiError>;
}

/// Real client that talks to the GitHub REST API with blocking reqwest.
pub struct RestCommentApi {
    http: reqwest::blocking::Client,
    api_base: String,
    repo: RepoRef,
}

impl RestCommentApi {
    pub fn new(api_base: &str, token: &str, repo: RepoRef, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("pr-annotate"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            reqwest::header::HeaderValue::from_static("2022-11-28"),
        );
        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .context("GitHub token contains characters not allowed in a header")?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = reqwest::blocking::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build GitHub HTTP client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            repo,
        })
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.repo.owner, self.repo.name, suffix
        )
    }

    fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(classify_failure(endpoint, response));
        }

        response.json::<T>().map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

/// Map a non-success response onto the error taxonomy.
fn classify_failure(endpoint: &str, response: Response) -> ApiError {
    let status = response.status().as_u16();
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
    };
    let quota_exhausted = header("x-ratelimit-remaining").as_deref() == Some("0");
    let retry_after_secs = header("retry-after").and_then(|v| v.parse().ok());
    let endpoint = endpoint.to_string();

    match status {
        429 => ApiError::RateLimited {
            endpoint,
            retry_after_secs,
        },
        403 if quota_exhausted => ApiError::RateLimited {
            endpoint,
            retry_after_secs,
        },
        401 | 403 => ApiError::Unauthorized { endpoint, status },
        404 => ApiError::NotFound { endpoint },
        _ => {
            let body = response.text().unwrap_or_default();
            ApiError::Status {
                endpoint,
                status,
                body: body.chars().take(ERROR_BODY_LIMIT).collect(),
            }
        }
    }
}

// REST response structures
#[derive(Deserialize)]
struct GhComment {
    id: u64,
    body: Option<String>,
    user: Option<GhUser>,
    path: Option<String>,
    line: Option<u64>,
    position: Option<u64>,
    in_reply_to_id: Option<u64>,
    #[serde(default)]
    created_at: String,
}

#[derive(Deserialize)]
struct GhUser {
    login: String,
}

#[derive(Deserialize)]
struct GhPullRequest {
    number: u64,
    body: Option<String>,
    head: GhHead,
}

#[derive(Deserialize)]
struct GhHead {
    sha: String,
}

impl From<GhComment> for Comment {
    fn from(c: GhComment) -> Self {
        Comment {
            id: c.id,
            body: c.body.unwrap_or_default(),
            author: c.user.map(|u| u.login).unwrap_or_else(|| GHOST_AUTHOR.to_string()),
            path: c.path,
            line: c.line,
            position: c.position,
            in_reply_to: c.in_reply_to_id,
            created_at: c.created_at,
        }
    }
}

/// JSON shape of an inline comment, shared by single comments and reviews.
fn draft_json(draft: &InlineDraft) -> serde_json::Value {
    let mut comment = json!({
        "path": draft.path,
        "body": draft.body,
    });
    match draft.anchor {
        Anchor::Line(line) => {
            comment["line"] = json!(line);
            comment["side"] = json!("RIGHT");
        }
        Anchor::Position(position) => {
            comment["position"] = json!(position);
        }
    }
    comment
}

impl CommentApi for RestCommentApi {
    fn list_comments_page(
        &self,
        category: CommentCategory,
        pr_number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>, ApiError> {
        let (endpoint, url) = match category {
            CommentCategory::Issue => (
                "list issue comments",
                self.repo_url(&format!("issues/{}/comments", pr_number)),
            ),
            CommentCategory::Review => (
                "list review comments",
                self.repo_url(&format!("pulls/{}/comments", pr_number)),
            ),
        };
        let per_page = per_page.to_string();
        let page = page.to_string();
        let rows: Vec<GhComment> = self.send(
            endpoint,
            self.http
                .get(url)
                .query(&[("per_page", per_page.as_str()), ("page", page.as_str())]),
        )?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    fn create_issue_comment(&self, pr_number: u64, body: &str) -> Result<Comment, ApiError> {
        let row: GhComment = self.send(
            "create issue comment",
            self.http
                .post(self.repo_url(&format!("issues/{}/comments", pr_number)))
                .json(&json!({ "body": body })),
        )?;
        Ok(row.into())
    }

    fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<Comment, ApiError> {
        let row: GhComment = self.send(
            "update issue comment",
            self.http
                .patch(self.repo_url(&format!("issues/comments/{}", comment_id)))
                .json(&json!({ "body": body })),
        )?;
        Ok(row.into())
    }

    fn create_review_comment(
        &self,
        pr_number: u64,
        commit_id: &str,
        draft: &InlineDraft,
    ) -> Result<Comment, ApiError> {
        let mut payload = draft_json(draft);
        payload["commit_id"] = json!(commit_id);
        let row: GhComment = self.send(
            "create review comment",
            self.http
                .post(self.repo_url(&format!("pulls/{}/comments", pr_number)))
                .json(&payload),
        )?;
        Ok(row.into())
    }

    fn update_review_comment(&self, comment_id: u64, body: &str) -> Result<Comment, ApiError> {
        let row: GhComment = self.send(
            "update review comment",
            self.http
                .patch(self.repo_url(&format!("pulls/comments/{}", comment_id)))
                .json(&json!({ "body": body })),
        )?;
        Ok(row.into())
    }

    fn create_review_reply(
        &self,
        pr_number: u64,
        parent_id: u64,
        body: &str,
    ) -> Result<Comment, ApiError> {
        let row: GhComment = self.send(
            "reply to review comment",
            self.http
                .post(self.repo_url(&format!(
                    "pulls/{}/comments/{}/replies",
                    pr_number, parent_id
                )))
                .json(&json!({ "body": body })),
        )?;
        Ok(row.into())
    }

    fn create_review(
        &self,
        pr_number: u64,
        commit_id: &str,
        drafts: &[InlineDraft],
    ) -> Result<(), ApiError> {
        let comments: Vec<serde_json::Value> = drafts.iter().map(draft_json).collect();
        let _: IgnoredAny = self.send(
            "create review",
            self.http
                .post(self.repo_url(&format!("pulls/{}/reviews", pr_number)))
                .json(&json!({
                    "commit_id": commit_id,
                    "event": "COMMENT",
                    "comments": comments,
                })),
        )?;
        Ok(())
    }

    fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest, ApiError> {
        let pr: GhPullRequest = self.send(
            "get pull request",
            self.http.get(self.repo_url(&format!("pulls/{}", pr_number))),
        )?;
        Ok(PullRequest {
            number: pr.number,
            body: pr.body.unwrap_or_default(),
            head_sha: pr.head.sha,
        })
    }

    fn update_pull_request_body(&self, pr_number: u64, body: &str) -> Result<(), ApiError> {
        let _: IgnoredAny = self.send(
            "update pull request",
            self.http
                .patch(self.repo_url(&format!("pulls/{}", pr_number)))
                .json(&json!({ "body": body })),
        )?;
        Ok(())
    }
}
