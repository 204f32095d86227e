// Conversation chains rebuilt from the flat review-comment list.
// A chain is a root comment plus its direct replies, rendered as "author: body" entries.

use std::collections::{HashMap, HashSet};

use crate::comment::{Anchor, Comment, CommentCategory};
use crate::writer::Commenter;

/// Separator between entries when a chain is rendered as one string.
pub const ENTRY_SEPARATOR: &str = "\n---\n";

/// Render one chain entry.
pub fn render_entry(comment: &Comment) -> String {
    format!("{}: {}", comment.author, comment.body)
}

/// Compose the chain rooted at `root`: the root's entry followed by the
/// comments replying directly to it, in listing order.
pub fn compose_chain(comments: &[Comment], root: &Comment) -> Vec<String> {
    std::iter::once(root)
        .chain(comments.iter().filter(|c| c.in_reply_to == Some(root.id)))
        .map(render_entry)
        .collect()
}

/// Walk reply pointers upward from `comment` to the start of its thread.
pub fn resolve_root<'c>(comments: &'c [Comment], comment: &'c Comment) -> &'c Comment {
    CommentIndex::new(comments).resolve_root(comment)
}

/// Lookup tables over one listing, built once so that resolving many
/// threads does not rescan the list each time.
pub struct CommentIndex<'c> {
    by_id: HashMap<u64, &'c Comment>,
    replies: HashMap<u64, Vec<&'c Comment>>,
}

impl<'c> CommentIndex<'c> {
    pub fn new(comments: &'c [Comment]) -> Self {
        let mut by_id = HashMap::with_capacity(comments.len());
        let mut replies: HashMap<u64, Vec<&'c Comment>> = HashMap::new();
        for comment in comments {
            by_id.entry(comment.id).or_insert(comment);
            if let Some(parent) = comment.in_reply_to {
                replies.entry(parent).or_default().push(comment);
            }
        }
        Self { by_id, replies }
    }

    pub fn get(&self, id: u64) -> Option<&'c Comment> {
        self.by_id.get(&id).copied()
    }

    /// Direct replies to `id`, in listing order.
    pub fn replies_to(&self, id: u64) -> &[&'c Comment] {
        self.replies.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Follow `in_reply_to` until a comment without a parent, a parent that is
    /// not in the listing, or a comment already visited.
    pub fn resolve_root(&self, comment: &'c Comment) -> &'c Comment {
        let mut current = comment;
        let mut visited = HashSet::from([current.id]);
        while let Some(parent_id) = current.in_reply_to {
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            if !visited.insert(parent.id) {
                tracing::warn!(comment = comment.id, at = parent.id, "reply chain loops back on itself");
                break;
            }
            current = parent;
        }
        current
    }

    /// Same as [`compose_chain`] but using the prebuilt reply table.
    pub fn compose(&self, root: &Comment) -> Vec<String> {
        std::iter::once(root)
            .chain(self.replies_to(root.id).iter().copied())
            .map(render_entry)
            .collect()
    }
}

/// A composed chain together with the comment that starts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationChain {
    pub root: Comment,
    pub entries: Vec<String>,
}

impl ConversationChain {
    pub fn text(&self) -> String {
        self.entries.join(ENTRY_SEPARATOR)
    }
}

/// Number chains into a single report.
pub fn format_chains_report(chains: &[String]) -> String {
    chains
        .iter()
        .enumerate()
        .map(|(i, chain)| format!("Conversation Chain {}:\n{}\n---\n", i + 1, chain))
        .collect()
}

impl Commenter<'_> {
    /// Report the chains rooted exactly at `path`/`anchor` whose text contains `tag_filter`.
    pub fn chains_at_line(
        &self,
        pr_number: u64,
        path: &str,
        anchor: Anchor,
        tag_filter: &str,
    ) -> String {
        let listing = self.list(CommentCategory::Review, pr_number);
        let index = CommentIndex::new(&listing.comments);

        let chains: Vec<String> = listing
            .comments
            .iter()
            .filter(|c| c.is_at(path, anchor) && index.resolve_root(c).id == c.id)
            .map(|root| index.compose(root).join(ENTRY_SEPARATOR))
            .filter(|chain| chain.contains(tag_filter))
            .collect();

        tracing::debug!(pr = pr_number, path, %anchor, chains = chains.len(), "composed conversation chains");
        format_chains_report(&chains)
    }

    /// The chain that `comment_id` belongs to, or `None` if it is not a
    /// review comment on this pull request.
    pub fn chain_for_comment(&self, pr_number: u64, comment_id: u64) -> Option<ConversationChain> {
        let listing = self.list(CommentCategory::Review, pr_number);
        let index = CommentIndex::new(&listing.comments);

        let comment = index.get(comment_id)?;
        let root = index.resolve_root(comment);
        Some(ConversationChain {
            root: root.clone(),
            entries: index.compose(root),
        })
    }
}
