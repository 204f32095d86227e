// Review comments anchored to a file location, batched reviews and threaded replies.
// Anchoring is exact: only comments at the same path and line (or position) are considered.

use std::fmt;

use crate::api::ApiError;
use crate::chains::CommentIndex;
use crate::comment::{Anchor, Comment, CommentCategory, InlineDraft, WriteOutcome};
use crate::writer::Commenter;

/// Counts from [`Commenter::submit_review`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl ReviewSummary {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.skipped
    }
}

impl fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, updated {}, unchanged {}, skipped {}",
            self.created, self.updated, self.unchanged, self.skipped
        )
    }
}

/// The tagged comment already sitting at `path`/`anchor`, if any.
fn tagged_at<'c>(comments: &'c [Comment], path: &str, anchor: Anchor, tag: &str) -> Option<&'c Comment> {
    comments
        .iter()
        .filter(|c| c.is_at(path, anchor) && !c.body.is_empty())
        .find(|c| c.body.contains(tag))
}

impl Commenter<'_> {
    /// Head commit of the pull request, for callers that did not name one.
    pub fn head_sha(&self, pr_number: u64) -> Result<String, ApiError> {
        Ok(self.api.get_pull_request(pr_number)?.head_sha)
    }

    /// Put `message` at `path`/`anchor`, updating the tagged comment there if
    /// one exists and creating a review comment on `commit_id` otherwise.
    pub fn anchor(
        &self,
        pr_number: u64,
        commit_id: &str,
        path: &str,
        anchor: Anchor,
        message: &str,
        tag: Option<&str>,
    ) -> WriteOutcome {
        let tag = self.effective_tag(tag);
        let body = self.render(message, tag);
        let listing = self.list(CommentCategory::Review, pr_number);

        match tagged_at(&listing.comments, path, anchor, tag) {
            Some(existing) => self.update_inline(pr_number, existing, &body),
            None => {
                let draft = InlineDraft {
                    path: path.to_string(),
                    anchor,
                    body,
                };
                match self.api.create_review_comment(pr_number, commit_id, &draft) {
                    Ok(created) => {
                        tracing::info!(pr = pr_number, comment = created.id, path, %anchor, "created review comment");
                        WriteOutcome::Created { id: created.id }
                    }
                    Err(e) => {
                        tracing::warn!(pr = pr_number, path, %anchor, error = %e, "failed to create review comment");
                        WriteOutcome::Skipped {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        }
    }

    fn update_inline(&self, pr_number: u64, existing: &Comment, body: &str) -> WriteOutcome {
        if existing.body == body {
            return WriteOutcome::Unchanged { id: existing.id };
        }
        match self.api.update_review_comment(existing.id, body) {
            Ok(updated) => {
                tracing::info!(pr = pr_number, comment = updated.id, location = %existing.location(), "updated review comment");
                WriteOutcome::Updated { id: updated.id }
            }
            Err(e) => {
                tracing::warn!(pr = pr_number, comment = existing.id, error = %e, "failed to update review comment");
                WriteOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Post a set of inline messages in one go.
    ///
    /// Draft bodies are messages; each is rendered with the greeting and
    /// `tag`. Locations that already carry the tag are updated in place and
    /// the rest are submitted as a single review. If the review is rejected
    /// the remaining drafts are posted one by one.
    pub fn submit_review(
        &self,
        pr_number: u64,
        commit_id: &str,
        drafts: Vec<InlineDraft>,
        tag: Option<&str>,
    ) -> ReviewSummary {
        let mut summary = ReviewSummary::default();
        if drafts.is_empty() {
            return summary;
        }

        let tag = self.effective_tag(tag);
        let listing = self.list(CommentCategory::Review, pr_number);
        let mut pending = Vec::new();

        for draft in drafts {
            let body = self.render(&draft.body, tag);
            match tagged_at(&listing.comments, &draft.path, draft.anchor, tag) {
                Some(existing) => match self.update_inline(pr_number, existing, &body) {
                    WriteOutcome::Updated { .. } => summary.updated += 1,
                    WriteOutcome::Unchanged { .. } => summary.unchanged += 1,
                    _ => summary.skipped += 1,
                },
                None => pending.push(InlineDraft { body, ..draft }),
            }
        }

        if pending.is_empty() {
            return summary;
        }

        match self.api.create_review(pr_number, commit_id, &pending) {
            Ok(()) => {
                tracing::info!(pr = pr_number, comments = pending.len(), "submitted review");
                summary.created += pending.len();
            }
            Err(e) => {
                tracing::warn!(
                    pr = pr_number,
                    comments = pending.len(),
                    error = %e,
                    "failed to submit review, posting comments individually"
                );
                for draft in &pending {
                    match self.api.create_review_comment(pr_number, commit_id, draft) {
                        Ok(_) => summary.created += 1,
                        Err(e) => {
                            tracing::warn!(pr = pr_number, path = %draft.path, anchor = %draft.anchor, error = %e, "failed to post review comment");
                            summary.skipped += 1;
                        }
                    }
                }
            }
        }
        summary
    }

    /// Reply in the thread containing `comment_id`.
    ///
    /// The reply goes to the thread's root and carries the reply tag. The root
    /// then has its comment tag swapped for the reply tag, so later inline
    /// writes at that location start a fresh comment.
    pub fn reply_to_review_comment(&self, pr_number: u64, comment_id: u64, message: &str) -> WriteOutcome {
        let listing = self.list(CommentCategory::Review, pr_number);
        let index = CommentIndex::new(&listing.comments);
        let root = index.get(comment_id).map(|c| index.resolve_root(c));
        let parent_id = root.map_or(comment_id, |r| r.id);
        if root.is_none() {
            tracing::warn!(pr = pr_number, comment = comment_id, "comment not found in listing, replying to it directly");
        }

        let reply_tag = &self.config.reply_tag;
        let body = self.render(message, reply_tag);
        let outcome = match self.api.create_review_reply(pr_number, parent_id, &body) {
            Ok(reply) => {
                tracing::info!(pr = pr_number, parent = parent_id, comment = reply.id, "posted reply");
                WriteOutcome::Created { id: reply.id }
            }
            Err(e) => {
                tracing::warn!(pr = pr_number, parent = parent_id, error = %e, "failed to post reply");
                let notice = self.render(
                    &format!(
                        "Could not post the reply to the top-level comment due to the following error: {}",
                        e
                    ),
                    reply_tag,
                );
                if let Err(notice_err) = self.api.create_review_reply(pr_number, parent_id, &notice) {
                    tracing::warn!(pr = pr_number, parent = parent_id, error = %notice_err, "failed to post error notice");
                }
                WriteOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        };

        if let Some(root) = root {
            self.retag_root(root);
        }
        outcome
    }

    fn retag_root(&self, root: &Comment) {
        let comment_tag = &self.config.comment_tag;
        if comment_tag.is_empty() || !root.body.contains(comment_tag.as_str()) {
            return;
        }
        let body = root.body.replace(comment_tag.as_str(), &self.config.reply_tag);
        if let Err(e) = self.api.update_review_comment(root.id, &body) {
            tracing::warn!(comment = root.id, error = %e, "failed to retag thread root");
        }
    }
}
