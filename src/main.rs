// pr-annotate: keep tagged bot comments on a GitHub pull request up to date.
// Writes issue comments, inline review comments, replies and a managed description section.

use anyhow::{Context, Result};
use clap::Parser;
use pr_annotate::api::RestCommentApi;
use pr_annotate::cli::{Cli, Command, anchor_from};
use pr_annotate::comment::{WriteMode, WriteOutcome};
use pr_annotate::config;
use pr_annotate::credentials::{CredentialProvider, RealCredentialProvider};
use pr_annotate::description::PatchOutcome;
use pr_annotate::github::{GhTargetDetector, resolve_target};
use pr_annotate::writer::Commenter;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Log to stderr, `warn` and above unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

/// Run one command. Returns false when the command should exit non-zero
/// without an error message of its own.
fn run(cli: Cli) -> Result<bool> {
    let config = config::load_config(cli.config.as_deref())?;

    let provider = RealCredentialProvider {
        token: cli.token.clone(),
    };
    let creds = provider.get_credentials()?;

    let target = resolve_target(&GhTargetDetector, cli.repo.as_deref(), cli.pr)?;
    tracing::debug!(%target, "resolved discussion target");

    let api = RestCommentApi::new(
        &config.api_url,
        &creds.github_token,
        target.repo.clone(),
        config.request_timeout(),
    )?;
    let commenter = Commenter::new(&api, &config);
    let pr = target.pr_number;

    match cli.command {
        Command::Comment { message, tag, mode } => {
            let outcome = commenter.write(pr, &message, tag.as_deref(), WriteMode::parse_lenient(&mode));
            Ok(report_write(&outcome, cli.strict))
        }

        Command::Inline {
            path,
            line,
            position,
            message,
            tag,
            commit,
        } => {
            let anchor = anchor_from(line, position).context("Either --line or --position is required")?;
            let commit = commit_or_head(&commenter, pr, commit)?;
            let outcome = commenter.anchor(pr, &commit, &path, anchor, &message, tag.as_deref());
            Ok(report_write(&outcome, cli.strict))
        }

        Command::Review { comments, tag, commit } => {
            let commit = commit_or_head(&commenter, pr, commit)?;
            let summary = commenter.submit_review(pr, &commit, comments, tag.as_deref());
            println!("{}", summary);
            Ok(!(cli.strict && summary.skipped > 0))
        }

        Command::Reply {
            in_reply_to,
            message,
        } => {
            let outcome = commenter.reply_to_review_comment(pr, in_reply_to, &message);
            Ok(report_write(&outcome, cli.strict))
        }

        Command::Chains {
            path,
            line,
            position,
            tag_filter,
        } => {
            let anchor = anchor_from(line, position).context("Either --line or --position is required")?;
            let report = commenter.chains_at_line(pr, &path, anchor, &tag_filter);
            if report.is_empty() {
                eprintln!("No conversation chains at {} {}", path, anchor);
            } else {
                print!("{}", report);
            }
            Ok(true)
        }

        Command::Thread { comment } => match commenter.chain_for_comment(pr, comment) {
            Some(chain) => {
                println!("Thread started by comment {} at {}:", chain.root.id, chain.root.location());
                println!("{}", chain.text());
                Ok(true)
            }
            None => {
                eprintln!("Comment {} is not a review comment on {}", comment, target);
                Ok(false)
            }
        },

        Command::Describe { message } => {
            let outcome = commenter.patch_description(pr, &message);
            println!("{}", outcome);
            Ok(!(cli.strict && matches!(outcome, PatchOutcome::Skipped { .. })))
        }

        Command::Description => {
            let text = commenter
                .description_text(pr)
                .with_context(|| format!("Failed to fetch the description of {}", target))?;
            println!("{}", text);
            Ok(true)
        }

        Command::Find { tag } => {
            let tag = commenter.effective_tag(tag.as_deref()).to_string();
            match commenter.find_comment_with_tag(pr, &tag) {
                Some(found) => {
                    println!("Comment {} by @{} ({}):", found.id, found.author, found.created_at);
                    println!("{}", found.body);
                    Ok(true)
                }
                None => {
                    eprintln!("No comment on {} carries the tag", target);
                    Ok(false)
                }
            }
        }
    }
}

fn commit_or_head(commenter: &Commenter<'_>, pr: u64, commit: Option<String>) -> Result<String> {
    match commit {
        Some(commit) => Ok(commit),
        None => commenter
            .head_sha(pr)
            .context("Failed to look up the head commit; pass --commit"),
    }
}

fn report_write(outcome: &WriteOutcome, strict: bool) -> bool {
    println!("{}", outcome);
    !(strict && outcome.is_skipped())
}
