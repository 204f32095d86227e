// CLI argument parsing using clap.
// Defines the command-line interface for pr-annotate.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::comment::{Anchor, InlineDraft};

#[derive(Parser, Debug)]
#[command(name = "pr-annotate")]
#[command(about = "Keep tagged bot comments on a GitHub pull request up to date")]
#[command(version)]
pub struct Cli {
    /// GitHub repository in OWNER/REPO format (auto-detected if not specified)
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    pub repo: Option<String>,

    /// Pull request number (auto-detected if not specified)
    #[arg(long, global = true)]
    pub pr: Option<u64>,

    /// GitHub token (falls back to `gh auth token`)
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Config file (default: ~/.config/pr-annotate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Exit non-zero when a write was skipped because the API call failed
    #[arg(long, global = true)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a tagged comment on the pull request conversation
    Comment {
        /// The message to post (greeting and tag are added around it)
        #[arg(long)]
        message: String,

        /// Tag identifying the comment across runs (default from config)
        #[arg(long)]
        tag: Option<String>,

        /// create, replace, append or prepend. Unknown values mean replace.
        #[arg(long, default_value = "replace")]
        mode: String,
    },

    /// Write a tagged review comment at a file line or diff position
    Inline {
        /// File path relative to the repository root
        #[arg(long)]
        path: String,

        /// Line in the new version of the file
        #[arg(long, conflicts_with = "position", required_unless_present = "position")]
        line: Option<u64>,

        /// Position in the diff hunk
        #[arg(long)]
        position: Option<u64>,

        #[arg(long)]
        message: String,

        #[arg(long)]
        tag: Option<String>,

        /// Commit to attach new comments to (default: PR head)
        #[arg(long)]
        commit: Option<String>,
    },

    /// Post several inline comments as one review
    Review {
        /// Inline comment as PATH:LINE=MESSAGE (can be repeated)
        #[arg(long = "comment", value_parser = parse_draft, required = true)]
        comments: Vec<InlineDraft>,

        #[arg(long)]
        tag: Option<String>,

        /// Commit to attach new comments to (default: PR head)
        #[arg(long)]
        commit: Option<String>,
    },

    /// Reply in the review thread containing a comment
    Reply {
        /// ID of any comment in the thread; the reply goes to the thread's first comment
        #[arg(long)]
        in_reply_to: u64,

        #[arg(long)]
        message: String,
    },

    /// Print the conversation chains started at a file line or diff position
    Chains {
        #[arg(long)]
        path: String,

        #[arg(long, conflicts_with = "position", required_unless_present = "position")]
        line: Option<u64>,

        #[arg(long)]
        position: Option<u64>,

        /// Only show chains containing this text
        #[arg(long, default_value = "")]
        tag_filter: String,
    },

    /// Print the conversation chain a review comment belongs to
    Thread {
        #[arg(long)]
        comment: u64,
    },

    /// Write the managed summary section of the PR description
    Describe {
        #[arg(long)]
        message: String,
    },

    /// Print the PR description without the managed section
    Description,

    /// Print the comment currently carrying a tag
    Find {
        #[arg(long)]
        tag: Option<String>,
    },
}

/// Build an anchor from the `--line`/`--position` pair.
pub fn anchor_from(line: Option<u64>, position: Option<u64>) -> Option<Anchor> {
    match (line, position) {
        (Some(line), _) => Some(Anchor::Line(line)),
        (None, Some(position)) => Some(Anchor::Position(position)),
        (None, None) => None,
    }
}

/// Parse `PATH:LINE=MESSAGE`. The path may itself contain colons.
fn parse_draft(raw: &str) -> Result<InlineDraft, String> {
    let (location, message) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected PATH:LINE=MESSAGE, got '{}'", raw))?;
    let (path, line) = location
        .rsplit_once(':')
        .ok_or_else(|| format!("missing ':LINE' in '{}'", location))?;
    let line: u64 = line
        .parse()
        .map_err(|_| format!("invalid line number '{}'", line))?;
    if path.is_empty() {
        return Err(format!("missing path in '{}'", location));
    }
    Ok(InlineDraft {
        path: path.to_string(),
        anchor: Anchor::Line(line),
        body: message.to_string(),
    })
}
