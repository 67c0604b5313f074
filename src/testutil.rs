//! Scripted provider doubles shared by the module tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::error::{Error, Result};
use crate::github::{Page, ReleaseHost};
use crate::llm::{GenerationParams, LLMProvider};
use crate::models::{CommitRef, PRInfo, ReleaseMetadata, RepositoryRef};

pub fn release(tag: &str, target_commit: &str) -> ReleaseMetadata {
    ReleaseMetadata {
        tag: tag.to_string(),
        published_at: Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
        target_commit: target_commit.to_string(),
    }
}

pub fn pr(number: u64, title: &str, labels: &[&str]) -> PRInfo {
    PRInfo {
        number,
        title: title.to_string(),
        body: None,
        author: format!("dev{}", number),
        labels: labels.iter().map(|s| s.to_string()).collect(),
        url: format!("https://example.com/pull/{}", number),
        additions: 10,
        deletions: 2,
        changed_files: 1,
        merged_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
            + chrono::Duration::hours(number as i64),
    }
}

/// Scripted GitHub host. Releases are newest first; commit pages back both
/// the compare walk and the no-previous-release history walk.
pub struct MockHost {
    releases: Vec<ReleaseMetadata>,
    commit_pages: Vec<Vec<CommitRef>>,
    windows: HashMap<(String, String), Vec<Vec<CommitRef>>>,
    pulls: HashMap<u64, PRInfo>,
    rate_limit_reset: Option<u64>,
    transient_failures: Mutex<u32>,
    delay: Option<std::time::Duration>,
    calls: Arc<AtomicU32>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            releases: Vec::new(),
            commit_pages: Vec::new(),
            windows: HashMap::new(),
            pulls: HashMap::new(),
            rate_limit_reset: None,
            transient_failures: Mutex::new(0),
            delay: None,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn releases(mut self, releases: Vec<ReleaseMetadata>) -> Self {
        self.releases = releases;
        self
    }

    pub fn commit_pages(mut self, pages: Vec<Vec<CommitRef>>) -> Self {
        self.commit_pages = pages;
        self
    }

    /// Scripted commit pages for one specific base..head comparison,
    /// overriding the shared `commit_pages`.
    pub fn window(mut self, base: &str, head: &str, pages: Vec<Vec<CommitRef>>) -> Self {
        self.windows
            .insert((base.to_string(), head.to_string()), pages);
        self
    }

    /// Every call stalls this long before answering.
    pub fn delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn pull(mut self, pr: PRInfo) -> Self {
        self.pulls.insert(pr.number, pr);
        self
    }

    pub fn rate_limited(mut self, reset_epoch: u64) -> Self {
        self.rate_limit_reset = Some(reset_epoch);
        self
    }

    /// Every call fails with a 502 until the budget runs out.
    pub fn transient_failures(self, count: u32) -> Self {
        *self.transient_failures.lock().unwrap() = count;
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicU32> {
        self.calls.clone()
    }

    async fn gate(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reset_epoch) = self.rate_limit_reset {
            return Err(Error::RateLimited { reset_epoch });
        }
        let mut failures = self.transient_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(Error::GitHubApi {
                status: 502,
                message: "upstream hiccup".to_string(),
            });
        }
        Ok(())
    }

    fn commit_page(&self, page: u32) -> Page<CommitRef> {
        let index = page.saturating_sub(1) as usize;
        Page {
            items: self.commit_pages.get(index).cloned().unwrap_or_default(),
            has_next: (index + 1) < self.commit_pages.len(),
        }
    }
}

#[async_trait]
impl ReleaseHost for MockHost {
    async fn release_by_tag(&self, repo: &RepositoryRef, tag: &str) -> Result<ReleaseMetadata> {
        self.gate().await?;
        self.releases
            .iter()
            .find(|r| r.tag == tag)
            .cloned()
            .ok_or_else(|| Error::ReleaseNotFound {
                repo: repo.full_name(),
                tag: tag.to_string(),
            })
    }

    async fn latest_release(&self, repo: &RepositoryRef) -> Result<ReleaseMetadata> {
        self.gate().await?;
        self.releases
            .first()
            .cloned()
            .ok_or_else(|| Error::ReleaseNotFound {
                repo: repo.full_name(),
                tag: "latest".to_string(),
            })
    }

    async fn list_releases(
        &self,
        _repo: &RepositoryRef,
        page: u32,
    ) -> Result<Page<ReleaseMetadata>> {
        self.gate().await?;
        if page == 1 {
            Ok(Page::last(self.releases.clone()))
        } else {
            Ok(Page::last(Vec::new()))
        }
    }

    async fn compare_commits(
        &self,
        _repo: &RepositoryRef,
        base: &str,
        head: &str,
        page: u32,
    ) -> Result<Page<CommitRef>> {
        self.gate().await?;
        if let Some(pages) = self.windows.get(&(base.to_string(), head.to_string())) {
            let index = page.saturating_sub(1) as usize;
            return Ok(Page {
                items: pages.get(index).cloned().unwrap_or_default(),
                has_next: (index + 1) < pages.len(),
            });
        }
        Ok(self.commit_page(page))
    }

    async fn commits_from(
        &self,
        _repo: &RepositoryRef,
        _head: &str,
        page: u32,
    ) -> Result<Page<CommitRef>> {
        self.gate().await?;
        Ok(self.commit_page(page))
    }

    async fn pull_request(&self, _repo: &RepositoryRef, number: u64) -> Result<Option<PRInfo>> {
        self.gate().await?;
        Ok(self.pulls.get(&number).cloned())
    }
}

/// Scripted LLM. Records every prompt; can fail transiently for the first
/// N calls or permanently for prompts containing a marker.
pub struct MockLlm {
    transient_failures: Mutex<u32>,
    fail_prompts_containing: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            transient_failures: Mutex::new(0),
            fail_prompts_containing: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn transient_failures(self, count: u32) -> Self {
        *self.transient_failures.lock().unwrap() = count;
        self
    }

    pub fn fail_prompts_containing(mut self, marker: &str) -> Self {
        self.fail_prompts_containing = Some(marker.to_string());
        self
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for MockLlm {
    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(marker) = &self.fail_prompts_containing {
            if prompt.contains(marker) {
                return Err(Error::LlmApi {
                    status: 400,
                    message: "rejected".to_string(),
                });
            }
        }

        let mut failures = self.transient_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(Error::LlmApi {
                status: 529,
                message: "overloaded".to_string(),
            });
        }

        Ok(format!("generated ({} chars in)", prompt.len()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
