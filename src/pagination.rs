// Paginated listing of issue and review comments.
// Walks pages until a short page; a failed page truncates the listing instead of discarding it.

use crate::api::CommentApi;
use crate::comment::{Comment, CommentCategory};
use crate::config::Paging;

/// All comments fetched for one category, in listing order.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub comments: Vec<Comment>,
    /// False when a page failed or the page bound was hit; `comments` is then a prefix.
    pub complete: bool,
}

/// Fetch every comment of `category` on the pull request.
///
/// Pages are requested sequentially starting at 1 and the walk stops at the
/// first page shorter than `paging.page_size`. A failing page ends the walk
/// with a warning and whatever was accumulated so far.
pub fn list_all(
    api: &dyn CommentApi,
    category: CommentCategory,
    pr_number: u64,
    paging: Paging,
) -> Listing {
    let page_size = paging.page_size.max(1);
    let mut comments = Vec::new();
    let mut page = 1u32;

    loop {
        let chunk = match api.list_comments_page(category, pr_number, page, page_size) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::warn!(
                    %category,
                    pr = pr_number,
                    page,
                    fetched = comments.len(),
                    error = %e,
                    "failed to list comments, continuing with partial result"
                );
                return Listing {
                    comments,
                    complete: false,
                };
            }
        };

        let chunk_len = chunk.len();
        comments.extend(chunk);

        if chunk_len < page_size as usize {
            tracing::debug!(%category, pr = pr_number, pages = page, total = comments.len(), "listed comments");
            return Listing {
                comments,
                complete: true,
            };
        }

        if page >= paging.max_pages {
            tracing::warn!(
                %category,
                pr = pr_number,
                max_pages = paging.max_pages,
                fetched = comments.len(),
                "page limit reached while pages were still full, listing may be incomplete"
            );
            return Listing {
                comments,
                complete: false,
            };
        }
        page = page.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeCommentApi, issue_comment};

    fn numbered(count: u64) -> Vec<Comment> {
        (1..=count)
            .map(|id| issue_comment(id, "alice", &format!("comment {}", id)))
            .collect()
    }

    fn paging(page_size: u32, max_pages: u32) -> Paging {
        Paging {
            page_size,
            max_pages,
        }
    }

    fn pages_requested(api: &FakeCommentApi) -> Vec<u32> {
        api.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ListPage { page, .. } => Some(page),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn stops_after_short_page() {
        let api = FakeCommentApi::with_issue_comments(numbered(242));

        let listing = list_all(&api, CommentCategory::Issue, 1, paging(100, 100));

        assert!(listing.complete);
        assert_eq!(listing.comments.len(), 242);
        assert_eq!(pages_requested(&api), vec![1, 2, 3]);
    }

    #[test]
    fn preserves_listing_order() {
        let api = FakeCommentApi::with_issue_comments(numbered(5));

        let listing = list_all(&api, CommentCategory::Issue, 1, paging(2, 100));

        let ids: Vec<u64> = listing.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn exact_multiple_needs_one_empty_page() {
        let api = FakeCommentApi::with_issue_comments(numbered(200));

        let listing = list_all(&api, CommentCategory::Issue, 1, paging(100, 100));

        assert!(listing.complete);
        assert_eq!(listing.comments.len(), 200);
        assert_eq!(pages_requested(&api), vec![1, 2, 3]);
    }

    #[test]
    fn empty_collection() {
        let api = FakeCommentApi::default();

        let listing = list_all(&api, CommentCategory::Review, 1, paging(100, 100));

        assert!(listing.complete);
        assert!(listing.comments.is_empty());
    }

    #[test]
    fn failure_mid_way_returns_partial_result() {
        let api = FakeCommentApi::with_issue_comments(numbered(250));
        api.fail_from_page(3);

        let listing = list_all(&api, CommentCategory::Issue, 1, paging(100, 100));

        assert!(!listing.complete);
        assert_eq!(listing.comments.len(), 200);
        assert_eq!(pages_requested(&api), vec![1, 2, 3]);
    }

    #[test]
    fn failure_on_first_page_is_empty_and_incomplete() {
        let api = FakeCommentApi::with_issue_comments(numbered(3));
        api.fail_from_page(1);

        let listing = list_all(&api, CommentCategory::Issue, 1, paging(100, 100));

        assert!(!listing.complete);
        assert!(listing.comments.is_empty());
    }

    #[test]
    fn endless_pages_stop_at_bound() {
        let api = FakeCommentApi::default();
        api.endless_pages();

        let listing = list_all(&api, CommentCategory::Issue, 1, paging(10, 4));

        assert!(!listing.complete);
        assert_eq!(listing.comments.len(), 40);
        assert_eq!(pages_requested(&api), vec![1, 2, 3, 4]);
    }
}
