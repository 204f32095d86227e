// Tagged issue-comment writes: create, replace, append or prepend.
// Write failures are logged and reported as WriteOutcome::Skipped rather than raised.

use crate::api::{ApiError, CommentApi};
use crate::comment::{Comment, CommentCategory, WriteMode, WriteOutcome, render_body};
use crate::config::Config;
use crate::pagination::{Listing, list_all};

/// Entry point for every comment operation on one repository.
///
/// Holds the API client and configuration for the run; the inline, chain and
/// description operations are implemented on this type in their own modules.
pub struct Commenter<'a> {
    pub(crate) api: &'a dyn CommentApi,
    pub(crate) config: &'a Config,
}

impl<'a> Commenter<'a> {
    pub fn new(api: &'a dyn CommentApi, config: &'a Config) -> Self {
        Self { api, config }
    }

    /// The tag to use when the caller gave none.
    pub fn effective_tag<'t>(&'t self, tag: Option<&'t str>) -> &'t str {
        match tag.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => &self.config.comment_tag,
        }
    }

    /// Render a message with the configured greeting and `tag`.
    pub fn render(&self, message: &str, tag: &str) -> String {
        render_body(&self.config.greeting, message, tag)
    }

    pub(crate) fn list(&self, category: CommentCategory, pr_number: u64) -> Listing {
        list_all(self.api, category, pr_number, self.config.paging())
    }

    /// Post `body` as a new issue comment, propagating any failure.
    pub fn post_comment(&self, pr_number: u64, body: &str) -> Result<Comment, ApiError> {
        let comment = self.api.create_issue_comment(pr_number, body)?;
        tracing::info!(pr = pr_number, comment = comment.id, "created comment");
        Ok(comment)
    }

    /// Write `message` into the comment owned by `tag` using `mode`.
    ///
    /// The message is rendered with the greeting and tag first. Without a
    /// tagged comment every mode creates a new one.
    pub fn write(
        &self,
        pr_number: u64,
        message: &str,
        tag: Option<&str>,
        mode: WriteMode,
    ) -> WriteOutcome {
        let tag = self.effective_tag(tag);
        let body = self.render(message, tag);

        if mode == WriteMode::Create {
            return self.create(pr_number, &body);
        }

        let Some(existing) = self.find_comment_with_tag(pr_number, tag) else {
            return self.create(pr_number, &body);
        };

        let merged = mode.merge(&existing.body, &body);
        if merged == existing.body {
            tracing::debug!(pr = pr_number, comment = existing.id, "comment already up to date");
            return WriteOutcome::Unchanged { id: existing.id };
        }

        match self.api.update_issue_comment(existing.id, &merged) {
            Ok(updated) => {
                tracing::info!(pr = pr_number, comment = updated.id, %mode, "updated comment");
                WriteOutcome::Updated { id: updated.id }
            }
            Err(e) => {
                tracing::warn!(pr = pr_number, comment = existing.id, error = %e, "failed to update comment");
                WriteOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn create(&self, pr_number: u64, body: &str) -> WriteOutcome {
        match self.post_comment(pr_number, body) {
            Ok(comment) => WriteOutcome::Created { id: comment.id },
            Err(e) => {
                tracing::warn!(pr = pr_number, error = %e, "failed to create comment");
                WriteOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }
}
