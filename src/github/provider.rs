use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CommitRef, PRInfo, ReleaseMetadata, RepositoryRef};

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next: false,
        }
    }
}

/// GitHub capability provider. Every implementation must surface
/// rate-limit state as `Error::RateLimited` and transient server failures
/// as `Error::GitHubApi` with the HTTP status; the fetcher owns the retry
/// policy.
#[async_trait]
pub trait ReleaseHost: Send + Sync {
    /// Release published under an exact tag, `Error::ReleaseNotFound` if absent.
    async fn release_by_tag(&self, repo: &RepositoryRef, tag: &str) -> Result<ReleaseMetadata>;

    /// Most recent non-draft, non-prerelease release.
    async fn latest_release(&self, repo: &RepositoryRef) -> Result<ReleaseMetadata>;

    /// Published releases, newest first. Pages are 1-based.
    async fn list_releases(&self, repo: &RepositoryRef, page: u32)
        -> Result<Page<ReleaseMetadata>>;

    /// Commits reachable from `head` but not `base` (the release window).
    async fn compare_commits(
        &self,
        repo: &RepositoryRef,
        base: &str,
        head: &str,
        page: u32,
    ) -> Result<Page<CommitRef>>;

    /// Commit history starting at `head`, newest first. Used when a release
    /// has no predecessor.
    async fn commits_from(
        &self,
        repo: &RepositoryRef,
        head: &str,
        page: u32,
    ) -> Result<Page<CommitRef>>;

    /// Full PR metadata, or `None` when the number is not a merged PR
    /// (issue references share the `#N` namespace).
    async fn pull_request(&self, repo: &RepositoryRef, number: u64) -> Result<Option<PRInfo>>;
}
