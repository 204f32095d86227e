// Tag matching: a tag is an opaque marker embedded in a comment body.
// The first comment in listing order that contains the tag is the canonical one.

use crate::comment::{Comment, CommentCategory};
use crate::writer::Commenter;

/// Returns the first comment whose body contains `tag`.
/// An empty tag matches nothing.
pub fn find_tagged<'c>(comments: &'c [Comment], tag: &str) -> Option<&'c Comment> {
    if tag.is_empty() {
        return None;
    }
    comments.iter().find(|c| c.body.contains(tag))
}

/// Returns every comment whose body contains `tag`, in listing order.
pub fn all_tagged<'c>(comments: &'c [Comment], tag: &str) -> Vec<&'c Comment> {
    if tag.is_empty() {
        return Vec::new();
    }
    comments.iter().filter(|c| c.body.contains(tag)).collect()
}

impl Commenter<'_> {
    /// Find the canonical issue comment carrying `tag` on the pull request.
    ///
    /// Returns `None` when nothing matches, including when listing failed
    /// before any page arrived. A partial listing is searched as-is.
    pub fn find_comment_with_tag(&self, pr_number: u64, tag: &str) -> Option<Comment> {
        let listing = self.list(CommentCategory::Issue, pr_number);
        let found = find_tagged(&listing.comments, tag)?;
        let count = all_tagged(&listing.comments, tag).len();
        if count > 1 {
            tracing::warn!(
                pr = pr_number,
                tag,
                count,
                chosen = found.id,
                "several comments carry the same tag, using the first"
            );
        }
        Some(found.clone())
    }
}
