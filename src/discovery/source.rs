//! Paginated listing capability
//!
//! [`RepositorySource`] is the boundary to the hosting platform. Every listing
//! call returns one [`Page`]; [`collect_pages`] walks a listing until the
//! source reports no further pages.

use crate::core::retry::{retry_async, RetryPolicy};
use crate::discovery::error::DiscoveryResult;
use crate::discovery::types::{Account, RemoteGist, RemoteRepo, Team};
use async_trait::async_trait;
use std::future::Future;

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of the following page, `None` on the last page
    pub next_page: Option<u32>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_page: None,
        }
    }
}

/// Which of the authenticated principal's repositories to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnRepoFilter {
    /// Private repositories visible to the principal
    Private,
    /// Repositories the principal owns
    Owned,
}

/// Listing capability of the hosting platform
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// All repositories of an organization, or only private ones
    async fn org_repos(
        &self,
        org: &str,
        private_only: bool,
        page: u32,
    ) -> DiscoveryResult<Page<RemoteRepo>>;

    /// Repositories of a named user
    async fn user_repos(&self, user: &str, page: u32) -> DiscoveryResult<Page<RemoteRepo>>;

    /// Repositories of the authenticated principal
    async fn own_repos(
        &self,
        filter: OwnRepoFilter,
        page: u32,
    ) -> DiscoveryResult<Page<RemoteRepo>>;

    /// Public and secret gists of a user
    async fn user_gists(&self, user: &str, page: u32) -> DiscoveryResult<Page<RemoteGist>>;

    async fn org_members(&self, org: &str, page: u32) -> DiscoveryResult<Page<Account>>;

    async fn org_teams(&self, org: &str, page: u32) -> DiscoveryResult<Page<Team>>;

    async fn team_repos(&self, team_id: u64, page: u32) -> DiscoveryResult<Page<RemoteRepo>>;
}

/// Walk a listing page by page and collect every item
///
/// Advisory failures (rate limit, request still processing) are retried under
/// `policy`. If they persist the listing ends with what was collected so far
/// and a warning; any other failure is returned.
pub async fn collect_pages<T, F, Fut>(
    listing: &str,
    policy: &RetryPolicy,
    mut fetch: F,
) -> DiscoveryResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DiscoveryResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page_number = 1u32;

    loop {
        let page = match retry_async(listing, policy.clone(), || fetch(page_number)).await {
            Ok(page) => page,
            Err(e) if e.is_advisory() => {
                log::warn!(
                    "Listing {} stopped at page {} after repeated advisory responses: {}",
                    listing,
                    page_number,
                    e
                );
                break;
            }
            Err(e) => return Err(e),
        };

        log::trace!(
            "Listing {} page {}: {} items",
            listing,
            page_number,
            page.items.len()
        );
        items.extend(page.items);

        match page.next_page {
            Some(next) if next > page_number => page_number = next,
            _ => break,
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::error::DiscoveryError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn paged(total: usize, page_size: usize, page: u32) -> DiscoveryResult<Page<usize>> {
        let start = (page as usize - 1) * page_size;
        let end = (start + page_size).min(total);
        let items = (start..end).collect();
        let next_page = if end < total { Some(page + 1) } else { None };
        Ok(Page { items, next_page })
    }

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_union_of_pages_for_any_page_size() {
        for total in [0usize, 1, 9, 10, 11, 47] {
            for page_size in [1usize, 3, 10, 100] {
                let items = collect_pages("numbers", &quick_policy(), move |page| async move {
                    paged(total, page_size, page)
                })
                .await
                .unwrap();

                assert_eq!(items.len(), total, "total {} size {}", total, page_size);
                let unique: HashSet<_> = items.iter().copied().collect();
                assert_eq!(unique.len(), total);
                assert!(items.iter().all(|i| *i < total));
            }
        }
    }

    #[tokio::test]
    async fn test_advisory_is_retried_then_continues() {
        let calls = AtomicUsize::new(0);
        let items = collect_pages("flaky", &quick_policy(), |page| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 1 {
                    Err(DiscoveryError::Accepted {
                        endpoint: "flaky".into(),
                    })
                } else {
                    paged(6, 3, page)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_persistent_advisory_ends_listing() {
        let items = collect_pages("limited", &quick_policy(), move |page| async move {
            if page == 1 {
                paged(10, 5, page)
            } else {
                Err(DiscoveryError::RateLimited {
                    endpoint: "limited".into(),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(items, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_fatal_error_propagates() {
        let result: DiscoveryResult<Vec<usize>> =
            collect_pages("denied", &quick_policy(), |_| async {
                Err(DiscoveryError::Unauthorized {
                    endpoint: "denied".into(),
                    message: "Bad credentials".into(),
                })
            })
            .await;

        assert!(matches!(result, Err(DiscoveryError::Unauthorized { .. })));
    }
}
