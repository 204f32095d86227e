// Comment data model shared by the writer, the inline commenter and the chain composer.
// Also owns the body template that tags are matched against across runs.

use std::fmt;

/// Login used when GitHub returns a comment without an author (deleted account).
pub const GHOST_AUTHOR: &str = "ghost";

/// Which comment collection of a pull request a comment lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentCategory {
    /// Conversation-tab comments (`/issues/{n}/comments`).
    Issue,
    /// Inline diff comments (`/pulls/{n}/comments`).
    Review,
}

impl fmt::Display for CommentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentCategory::Issue => write!(f, "issue"),
            CommentCategory::Review => write!(f, "review"),
        }
    }
}

/// Where an inline comment sits in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// A line number in the new version of the file.
    Line(u64),
    /// A position inside the unified diff hunk.
    Position(u64),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Line(line) => write!(f, "line {}", line),
            Anchor::Position(position) => write!(f, "position {}", position),
        }
    }
}

/// A comment as returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub author: String,
    pub path: Option<String>,
    pub line: Option<u64>,
    pub position: Option<u64>,
    pub in_reply_to: Option<u64>,
    pub created_at: String,
}

impl Comment {
    /// Returns true if this comment sits exactly at `path` and `anchor`.
    pub fn is_at(&self, path: &str, anchor: Anchor) -> bool {
        if self.path.as_deref() != Some(path) {
            return false;
        }
        match anchor {
            Anchor::Line(line) => self.line == Some(line),
            Anchor::Position(position) => self.position == Some(position),
        }
    }

    /// Returns true if this comment starts a thread.
    pub fn is_root(&self) -> bool {
        self.in_reply_to.is_none()
    }

    /// Format the comment location for display.
    pub fn location(&self) -> String {
        match (&self.path, self.line, self.position) {
            (Some(path), Some(line), _) => format!("{}:{}", path, line),
            (Some(path), None, Some(position)) => format!("{} (position {})", path, position),
            (Some(path), None, None) => path.clone(),
            _ => "conversation".to_string(),
        }
    }
}

/// An inline comment that has not been posted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineDraft {
    pub path: String,
    pub anchor: Anchor,
    pub body: String,
}

/// The parts of a pull request this tool reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub body: String,
    pub head_sha: String,
}

/// How a new body is combined with an existing tagged comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Always post a new comment.
    Create,
    /// Overwrite the tagged comment.
    #[default]
    Replace,
    /// Add the new body after the existing one.
    Append,
    /// Add the new body before the existing one.
    Prepend,
}

impl WriteMode {
    /// Parse a mode name. Unknown names fall back to `Replace` with a warning.
    pub fn parse_lenient(mode: &str) -> Self {
        match mode.trim().to_ascii_lowercase().as_str() {
            "create" => WriteMode::Create,
            "replace" => WriteMode::Replace,
            "append" => WriteMode::Append,
            "prepend" => WriteMode::Prepend,
            other => {
                tracing::warn!(mode = other, "unknown write mode, using replace");
                WriteMode::Replace
            }
        }
    }

    /// Compute the body to store given the existing tagged comment's body.
    /// `Create` has no existing body to merge with and returns the new body.
    pub fn merge(self, existing: &str, new: &str) -> String {
        match self {
            WriteMode::Create | WriteMode::Replace => new.to_string(),
            WriteMode::Append => format!("{} {}", existing, new),
            WriteMode::Prepend => format!("{} {}", new, existing),
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteMode::Create => "create",
            WriteMode::Replace => "replace",
            WriteMode::Append => "append",
            WriteMode::Prepend => "prepend",
        };
        write!(f, "{}", name)
    }
}

/// Result of a write that never raises.
///
/// `Skipped` carries the swallowed failure so callers that care can tell
/// "nothing needed to change" (`Unchanged`) apart from "the update was lost".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created { id: u64 },
    Updated { id: u64 },
    Unchanged { id: u64 },
    Skipped { reason: String },
}

impl WriteOutcome {
    /// The id of the comment that now holds the content, if any.
    pub fn comment_id(&self) -> Option<u64> {
        match self {
            WriteOutcome::Created { id }
            | WriteOutcome::Updated { id }
            | WriteOutcome::Unchanged { id } => Some(*id),
            WriteOutcome::Skipped { .. } => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, WriteOutcome::Skipped { .. })
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOutcome::Created { id } => write!(f, "created comment {}", id),
            WriteOutcome::Updated { id } => write!(f, "updated comment {}", id),
            WriteOutcome::Unchanged { id } => write!(f, "comment {} already up to date", id),
            WriteOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
        }
    }
}

/// Render a comment body: greeting, blank line, message, blank line, tag.
/// Tag matching on later runs depends on this layout staying fixed.
pub fn render_body(greeting: &str, message: &str, tag: &str) -> String {
    format!("{}\n\n{}\n\n{}", greeting, message, tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review_comment(path: &str, line: Option<u64>, position: Option<u64>) -> Comment {
        Comment {
            id: 1,
            body: "body".to_string(),
            author: "alice".to_string(),
            path: Some(path.to_string()),
            line,
            position,
            in_reply_to: None,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn parse_known_modes() {
        assert_eq!(WriteMode::parse_lenient("create"), WriteMode::Create);
        assert_eq!(WriteMode::parse_lenient("replace"), WriteMode::Replace);
        assert_eq!(WriteMode::parse_lenient("Append"), WriteMode::Append);
        assert_eq!(WriteMode::parse_lenient(" prepend "), WriteMode::Prepend);
    }

    #[test]
    fn parse_unknown_mode_falls_back_to_replace() {
        assert_eq!(WriteMode::parse_lenient("upsert"), WriteMode::Replace);
        assert_eq!(WriteMode::parse_lenient(""), WriteMode::Replace);
    }

    #[test]
    fn append_joins_with_single_space() {
        assert_eq!(WriteMode::Append.merge("A", "B"), "A B");
    }

    #[test]
    fn prepend_joins_with_single_space() {
        assert_eq!(WriteMode::Prepend.merge("A", "B"), "B A");
    }

    #[test]
    fn replace_discards_existing() {
        assert_eq!(WriteMode::Replace.merge("A", "B"), "B");
    }

    #[test]
    fn render_body_layout() {
        let body = render_body("Hello", "Looks fine.", "<!-- BOT -->");
        assert_eq!(body, "Hello\n\nLooks fine.\n\n<!-- BOT -->");
    }

    #[test]
    fn is_at_requires_exact_line() {
        let comment = review_comment("src/lib.rs", Some(10), None);
        assert!(comment.is_at("src/lib.rs", Anchor::Line(10)));
        assert!(!comment.is_at("src/lib.rs", Anchor::Line(11)));
        assert!(!comment.is_at("src/main.rs", Anchor::Line(10)));
        assert!(!comment.is_at("src/lib.rs", Anchor::Position(10)));
    }

    #[test]
    fn is_at_position() {
        let comment = review_comment("src/lib.rs", None, Some(4));
        assert!(comment.is_at("src/lib.rs", Anchor::Position(4)));
        assert!(!comment.is_at("src/lib.rs", Anchor::Line(4)));
    }

    #[test]
    fn location_formats() {
        assert_eq!(review_comment("a.rs", Some(3), None).location(), "a.rs:3");
        assert_eq!(
            review_comment("a.rs", None, Some(7)).location(),
            "a.rs (position 7)"
        );
        let mut issue = review_comment("a.rs", None, None);
        issue.path = None;
        assert_eq!(issue.location(), "conversation");
    }

    #[test]
    fn outcome_comment_id() {
        assert_eq!(WriteOutcome::Created { id: 4 }.comment_id(), Some(4));
        assert_eq!(WriteOutcome::Unchanged { id: 5 }.comment_id(), Some(5));
        let skipped = WriteOutcome::Skipped {
            reason: "boom".to_string(),
        };
        assert_eq!(skipped.comment_id(), None);
        assert!(skipped.is_skipped());
    }
}
