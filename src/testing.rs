// In-memory CommentApi used by the unit tests of the core modules.
// Records every call and can be told to fail specific operations.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::api::{ApiError, CommentApi};
use crate::comment::{Comment, CommentCategory, InlineDraft, PullRequest};

/// Operation names accepted by [`FakeCommentApi::fail`].
pub const OP_LIST: &str = "list";
pub const OP_CREATE_ISSUE: &str = "create_issue";
pub const OP_UPDATE_ISSUE: &str = "update_issue";
pub const OP_CREATE_REVIEW_COMMENT: &str = "create_review_comment";
pub const OP_UPDATE_REVIEW: &str = "update_review";
pub const OP_REPLY: &str = "reply";
pub const OP_REVIEW: &str = "review";
pub const OP_GET_PR: &str = "get_pr";
pub const OP_UPDATE_PR: &str = "update_pr";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListPage { category: CommentCategory, page: u32 },
    CreateIssue { body: String },
    UpdateIssue { id: u64, body: String },
    CreateReviewComment { commit_id: String, draft: InlineDraft },
    UpdateReview { id: u64, body: String },
    Reply { parent_id: u64, body: String },
    Review { commit_id: String, drafts: Vec<InlineDraft> },
    GetPullRequest,
    UpdatePullRequestBody { body: String },
}

pub struct FakeCommentApi {
    pub issue_comments: RefCell<Vec<Comment>>,
    pub review_comments: RefCell<Vec<Comment>>,
    pub pr_body: RefCell<String>,
    pub head_sha: String,
    pub calls: RefCell<Vec<Call>>,
    failing: RefCell<HashSet<&'static str>>,
    fail_from_page: Cell<Option<u32>>,
    endless: Cell<bool>,
    next_id: Cell<u64>,
}

impl Default for FakeCommentApi {
    fn default() -> Self {
        Self {
            issue_comments: RefCell::new(Vec::new()),
            review_comments: RefCell::new(Vec::new()),
            pr_body: RefCell::new(String::new()),
            head_sha: "0123abcd".to_string(),
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            fail_from_page: Cell::new(None),
            endless: Cell::new(false),
            next_id: Cell::new(1000),
        }
    }
}

impl FakeCommentApi {
    pub fn with_issue_comments(comments: Vec<Comment>) -> Self {
        let api = Self::default();
        *api.issue_comments.borrow_mut() = comments;
        api
    }

    pub fn with_review_comments(comments: Vec<Comment>) -> Self {
        let api = Self::default();
        *api.review_comments.borrow_mut() = comments;
        api
    }

    pub fn with_description(body: &str) -> Self {
        let api = Self::default();
        *api.pr_body.borrow_mut() = body.to_string();
        api
    }

    /// Make every future call of `op` fail.
    pub fn fail(&self, op: &'static str) {
        self.failing.borrow_mut().insert(op);
    }

    /// Make listing fail starting at `page`.
    pub fn fail_from_page(&self, page: u32) {
        self.fail_from_page.set(Some(page));
    }

    /// Make every listed page full, forever.
    pub fn endless_pages(&self) {
        self.endless.set(true);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Calls that change remote state.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::ListPage { .. } | Call::GetPullRequest))
            .collect()
    }

    fn check(&self, op: &'static str) -> Result<(), ApiError> {
        if self.failing.borrow().contains(op) {
            return Err(ApiError::Status {
                endpoint: op.to_string(),
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn allocate_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn update_body(comments: &RefCell<Vec<Comment>>, id: u64, body: &str, op: &str) -> Result<Comment, ApiError> {
        let mut comments = comments.borrow_mut();
        let comment = comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ApiError::NotFound {
                endpoint: op.to_string(),
            })?;
        comment.body = body.to_string();
        Ok(comment.clone())
    }
}

impl CommentApi for FakeCommentApi {
    fn list_comments_page(
        &self,
        category: CommentCategory,
        _pr_number: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Comment>, ApiError> {
        self.calls.borrow_mut().push(Call::ListPage { category, page });
        self.check(OP_LIST)?;
        if let Some(failing_page) = self.fail_from_page.get() {
            if page >= failing_page {
                return Err(ApiError::Status {
                    endpoint: OP_LIST.to_string(),
                    status: 502,
                    body: "injected page failure".to_string(),
                });
            }
        }
        if self.endless.get() {
            return Ok((0..per_page)
                .map(|i| issue_comment(u64::from(page) * 1000 + u64::from(i), "bot", "filler"))
                .collect());
        }

        let source = match category {
            CommentCategory::Issue => self.issue_comments.borrow(),
            CommentCategory::Review => self.review_comments.borrow(),
        };
        let start = (page.saturating_sub(1) as usize) * per_page as usize;
        Ok(source
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    fn create_issue_comment(&self, _pr_number: u64, body: &str) -> Result<Comment, ApiError> {
        self.calls.borrow_mut().push(Call::CreateIssue {
            body: body.to_string(),
        });
        self.check(OP_CREATE_ISSUE)?;
        let comment = issue_comment(self.allocate_id(), "pr-annotate[bot]", body);
        self.issue_comments.borrow_mut().push(comment.clone());
        Ok(comment)
    }

    fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<Comment, ApiError> {
        self.calls.borrow_mut().push(Call::UpdateIssue {
            id: comment_id,
            body: body.to_string(),
        });
        self.check(OP_UPDATE_ISSUE)?;
        Self::update_body(&self.issue_comments, comment_id, body, OP_UPDATE_ISSUE)
    }

    fn create_review_comment(
        &self,
        _pr_number: u64,
        commit_id: &str,
        draft: &InlineDraft,
    ) -> Result<Comment, ApiError> {
        self.calls.borrow_mut().push(Call::CreateReviewComment {
            commit_id: commit_id.to_string(),
            draft: draft.clone(),
        });
        self.check(OP_CREATE_REVIEW_COMMENT)?;
        let comment = draft_comment(self.allocate_id(), draft);
        self.review_comments.borrow_mut().push(comment.clone());
        Ok(comment)
    }

    fn update_review_comment(&self, comment_id: u64, body: &str) -> Result<Comment, ApiError> {
        self.calls.borrow_mut().push(Call::UpdateReview {
            id: comment_id,
            body: body.to_string(),
        });
        self.check(OP_UPDATE_REVIEW)?;
        Self::update_body(&self.review_comments, comment_id, body, OP_UPDATE_REVIEW)
    }

    fn create_review_reply(
        &self,
        _pr_number: u64,
        parent_id: u64,
        body: &str,
    ) -> Result<Comment, ApiError> {
        self.calls.borrow_mut().push(Call::Reply {
            parent_id,
            body: body.to_string(),
        });
        self.check(OP_REPLY)?;
        let parent = self
            .review_comments
            .borrow()
            .iter()
            .find(|c| c.id == parent_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                endpoint: OP_REPLY.to_string(),
            })?;
        let mut reply = parent;
        reply.id = self.allocate_id();
        reply.body = body.to_string();
        reply.author = "pr-annotate[bot]".to_string();
        reply.in_reply_to = Some(parent_id);
        self.review_comments.borrow_mut().push(reply.clone());
        Ok(reply)
    }

    fn create_review(
        &self,
        _pr_number: u64,
        commit_id: &str,
        drafts: &[InlineDraft],
    ) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(Call::Review {
            commit_id: commit_id.to_string(),
            drafts: drafts.to_vec(),
        });
        self.check(OP_REVIEW)?;
        for draft in drafts {
            let comment = draft_comment(self.allocate_id(), draft);
            self.review_comments.borrow_mut().push(comment);
        }
        Ok(())
    }

    fn get_pull_request(&self, pr_number: u64) -> Result<PullRequest, ApiError> {
        self.calls.borrow_mut().push(Call::GetPullRequest);
        self.check(OP_GET_PR)?;
        Ok(PullRequest {
            number: pr_number,
            body: self.pr_body.borrow().clone(),
            head_sha: self.head_sha.clone(),
        })
    }

    fn update_pull_request_body(&self, _pr_number: u64, body: &str) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(Call::UpdatePullRequestBody {
            body: body.to_string(),
        });
        self.check(OP_UPDATE_PR)?;
        *self.pr_body.borrow_mut() = body.to_string();
        Ok(())
    }
}

pub fn issue_comment(id: u64, author: &str, body: &str) -> Comment {
    Comment {
        id,
        body: body.to_string(),
        author: author.to_string(),
        path: None,
        line: None,
        position: None,
        in_reply_to: None,
        created_at: "2024-05-01T10:00:00Z".to_string(),
    }
}

pub fn review_comment(
    id: u64,
    author: &str,
    body: &str,
    path: &str,
    line: u64,
    in_reply_to: Option<u64>,
) -> Comment {
    Comment {
        id,
        body: body.to_string(),
        author: author.to_string(),
        path: Some(path.to_string()),
        line: Some(line),
        position: None,
        in_reply_to,
        created_at: "2024-05-01T10:00:00Z".to_string(),
    }
}

fn draft_comment(id: u64, draft: &InlineDraft) -> Comment {
    let (line, position) = match draft.anchor {
        crate::comment::Anchor::Line(line) => (Some(line), None),
        crate::comment::Anchor::Position(position) => (None, Some(position)),
    };
    Comment {
        id,
        body: draft.body.clone(),
        author: "pr-annotate[bot]".to_string(),
        path: Some(draft.path.clone()),
        line,
        position,
        in_reply_to: None,
        created_at: "2024-05-01T12:00:00Z".to_string(),
    }
}
