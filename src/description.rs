// Managed section of the pull request description, kept between two delimiter markers.
// Everything outside the markers belongs to the author and is preserved byte for byte.

use std::fmt;

use crate::writer::Commenter;

/// Result of [`Commenter::patch_description`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched,
    Unchanged,
    Skipped { reason: String },
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOutcome::Patched => write!(f, "description updated"),
            PatchOutcome::Unchanged => write!(f, "description already up to date"),
            PatchOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
        }
    }
}

/// Byte range of the delimited block, from the start of `start` to the end
/// of the first `end` that follows it.
fn locate(description: &str, start: &str, end: &str) -> Option<(usize, usize)> {
    if start.is_empty() || end.is_empty() {
        return None;
    }
    let start_idx = description.find(start)?;
    let search_from = start_idx + start.len();
    let end_idx = description[search_from..].find(end)? + search_from;
    Some((start_idx, end_idx + end.len()))
}

/// Check if the description holds a complete delimited block.
pub fn has_section(description: &str, start: &str, end: &str) -> bool {
    locate(description, start, end).is_some()
}

/// Text between the delimiters, if the block is present.
pub fn section_contents<'d>(description: &'d str, start: &str, end: &str) -> Option<&'d str> {
    let (block_start, block_end) = locate(description, start, end)?;
    Some(&description[block_start + start.len()..block_end - end.len()])
}

/// Remove the delimited block, markers included. Without a complete block
/// the description is returned as-is.
pub fn strip_section(description: &str, start: &str, end: &str) -> String {
    match locate(description, start, end) {
        Some((block_start, block_end)) => {
            format!("{}{}", &description[..block_start], &description[block_end..])
        }
        None => description.to_string(),
    }
}

/// Put `section` between the delimiters, replacing any previous block.
///
/// When the markers are missing (or the end marker only appears before the
/// start marker) a new block is appended after a newline. A block nested in
/// `section` itself is stripped so the markers never appear twice.
pub fn patch_section(description: &str, section: &str, start: &str, end: &str) -> String {
    let section = strip_section(section, start, end);
    match locate(description, start, end) {
        Some((block_start, block_end)) => format!(
            "{}{}{}{}{}",
            &description[..block_start],
            start,
            section,
            end,
            &description[block_end..]
        ),
        None => format!("{}\n{}{}{}", description, start, section, end),
    }
}

impl Commenter<'_> {
    /// Write `section` into the managed block of the pull request description.
    pub fn patch_description(&self, pr_number: u64, section: &str) -> PatchOutcome {
        let pr = match self.api.get_pull_request(pr_number) {
            Ok(pr) => pr,
            Err(e) => {
                tracing::warn!(pr = pr_number, error = %e, "failed to fetch pull request description");
                return PatchOutcome::Skipped {
                    reason: e.to_string(),
                };
            }
        };

        let start = &self.config.description_start;
        let end = &self.config.description_end;
        let patched = patch_section(&pr.body, section, start, end);
        if patched == pr.body {
            return PatchOutcome::Unchanged;
        }

        match self.api.update_pull_request_body(pr_number, &patched) {
            Ok(()) => {
                tracing::info!(pr = pr_number, appended = !has_section(&pr.body, start, end), "patched description");
                PatchOutcome::Patched
            }
            Err(e) => {
                tracing::warn!(pr = pr_number, error = %e, "failed to update pull request description");
                PatchOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// The description with the managed block removed, or `None` if it
    /// could not be fetched.
    pub fn description_text(&self, pr_number: u64) -> Option<String> {
        match self.api.get_pull_request(pr_number) {
            Ok(pr) => Some(strip_section(
                &pr.body,
                &self.config.description_start,
                &self.config.description_end,
            )),
            Err(e) => {
                tracing::warn!(pr = pr_number, error = %e, "failed to fetch pull request description");
                None
            }
        }
    }
}
