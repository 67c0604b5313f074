//! Resolves a release and collects the merged PRs inside its window.
//!
//! The window is the commit range between the previous published release
//! and the requested one; when no previous release exists, recent history
//! from the release's target commit is used instead, capped the same way
//! a first release would be browsed by hand.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::sleep;

use crate::error::{Error, Result};
use crate::github::ReleaseHost;
use crate::models::{
    CategoryMap, CommitRef, PRInfo, ReleaseAnalysis, ReleaseMetadata, ReleaseTagRequest,
    RepositoryRef,
};

/// Commit cap for releases with no predecessor.
const FIRST_RELEASE_COMMIT_CAP: usize = 50;

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub max_attempts: u32,
    pub retry_base: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_base: Duration::from_secs(1),
        }
    }
}

pub struct ReleaseFetcher {
    host: Arc<dyn ReleaseHost>,
    config: FetcherConfig,
}

impl ReleaseFetcher {
    pub fn new(host: Arc<dyn ReleaseHost>, config: FetcherConfig) -> Self {
        Self { host, config }
    }

    /// Fetches release metadata and the deduped, ascending-by-number PR
    /// list. Categories are attached afterwards by the categorizer.
    pub async fn fetch(
        &self,
        repo: &RepositoryRef,
        request: &ReleaseTagRequest,
    ) -> Result<ReleaseAnalysis> {
        tracing::debug!("Fetching {} at {}", repo, request.as_str());
        let metadata = match request {
            ReleaseTagRequest::Latest => {
                self.with_retries("latest release", || self.host.latest_release(repo))
                    .await?
            }
            ReleaseTagRequest::Tag(tag) => {
                self.with_retries("release by tag", || self.host.release_by_tag(repo, tag))
                    .await?
            }
        };
        tracing::info!("Analyzing release {} for {}", metadata.tag, repo);

        let previous = self.previous_release(repo, &metadata.tag).await?;
        match &previous {
            Some(prev) => tracing::debug!("Previous release: {}", prev.tag),
            None => tracing::debug!("No previous release, walking recent history"),
        }

        let commits = self.window_commits(repo, &metadata, previous.as_ref()).await?;
        tracing::info!("Walked {} commits in the release window", commits.len());

        let numbers: BTreeSet<u64> = commits
            .iter()
            .flat_map(|c| extract_pr_numbers(&c.message))
            .collect();

        let prs = self.hydrate_pulls(repo, numbers).await?;
        tracing::info!("Found {} merged PRs in release {}", prs.len(), metadata.tag);

        Ok(ReleaseAnalysis {
            repo: repo.clone(),
            metadata,
            prs,
            categories: CategoryMap::new(),
        })
    }

    /// The release published immediately before `tag`, if any. The host
    /// lists releases newest first.
    async fn previous_release(
        &self,
        repo: &RepositoryRef,
        tag: &str,
    ) -> Result<Option<ReleaseMetadata>> {
        let mut page = 1;
        let mut current_seen = false;

        loop {
            let releases = self
                .with_retries("list releases", || self.host.list_releases(repo, page))
                .await?;

            for release in releases.items {
                if current_seen {
                    return Ok(Some(release));
                }
                if release.tag == tag {
                    current_seen = true;
                }
            }

            if !releases.has_next {
                return Ok(None);
            }
            page += 1;
        }
    }

    async fn window_commits(
        &self,
        repo: &RepositoryRef,
        metadata: &ReleaseMetadata,
        previous: Option<&ReleaseMetadata>,
    ) -> Result<Vec<CommitRef>> {
        let mut commits = Vec::new();
        let mut page = 1;

        loop {
            let batch = match previous {
                Some(prev) => {
                    self.with_retries("compare commits", || {
                        self.host
                            .compare_commits(repo, &prev.tag, &metadata.tag, page)
                    })
                    .await?
                }
                None => {
                    self.with_retries("list commits", || {
                        self.host.commits_from(repo, &metadata.target_commit, page)
                    })
                    .await?
                }
            };

            commits.extend(batch.items);

            if previous.is_none() && commits.len() >= FIRST_RELEASE_COMMIT_CAP {
                commits.truncate(FIRST_RELEASE_COMMIT_CAP);
                break;
            }
            if !batch.has_next {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }

    /// Fetches full metadata for every referenced PR number. Numbers that
    /// turn out to be issues or unmerged PRs are skipped. The BTreeMap
    /// keys give the deterministic ascending order regardless of fetch
    /// order.
    async fn hydrate_pulls(
        &self,
        repo: &RepositoryRef,
        numbers: BTreeSet<u64>,
    ) -> Result<Vec<PRInfo>> {
        let pb = ProgressBar::new(numbers.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} PRs")
                .unwrap()
                .progress_chars("#>-"),
        );

        let mut pulls: BTreeMap<u64, PRInfo> = BTreeMap::new();
        for number in numbers {
            match self
                .with_retries("pull request", || self.host.pull_request(repo, number))
                .await?
            {
                Some(pr) => {
                    pulls.insert(pr.number, pr);
                }
                None => tracing::debug!("#{} is not a merged pull request, skipping", number),
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(pulls.into_values().collect())
    }

    /// Retries transient failures with exponential backoff, surfacing
    /// `Error::Fetch` once attempts are exhausted. Rate-limit errors pass
    /// through untouched on the first occurrence.
    async fn with_retries<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut delay = self.config.retry_base;
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.config.max_attempts => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        what,
                        attempt,
                        self.config.max_attempts,
                        delay,
                        e
                    );
                    sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(Error::Fetch {
                        attempts: self.config.max_attempts,
                        message: format!("{}: {}", what, e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Mines `#N` PR references out of a commit message. Merge commits
/// ("Merge pull request #123") and squash merges ("Fix parser (#456)")
/// both reduce to this pattern.
pub fn extract_pr_numbers(message: &str) -> Vec<u64> {
    message
        .split('#')
        .skip(1)
        .filter_map(|segment| {
            let digits: String = segment
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if digits.is_empty() {
                None
            } else {
                digits.parse().ok()
            }
        })
        .collect()
}
