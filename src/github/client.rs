use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header, Client, Response, StatusCode};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::github::provider::{Page, ReleaseHost};
use crate::models::{CommitRef, PRInfo, ReleaseMetadata, RepositoryRef};

const PER_PAGE: u32 = 100;

pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("releaselens/0.1"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: "https://api.github.com".to_string(),
        })
    }

    /// Sends a GET and maps the rate-limit and server-error cases before the
    /// caller sees the response.
    async fn get(&self, url: &str) -> Result<Response> {
        tracing::debug!("Fetching: {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if (status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS)
            && rate_limit_exhausted(&response)
        {
            let reset_epoch = header_u64(&response, "x-ratelimit-reset").unwrap_or(0);
            return Err(Error::RateLimited { reset_epoch });
        }

        Ok(response)
    }

    async fn fail_with_body(&self, response: Response, context: &str) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Error::GitHubApi {
            status,
            message: format!("{}: {}", context, body),
        }
    }
}

fn rate_limit_exhausted(response: &Response) -> bool {
    header_u64(response, "x-ratelimit-remaining") == Some(0)
}

fn header_u64(response: &Response, name: &str) -> Option<u64> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn has_next_page(response: &Response) -> bool {
    response
        .headers()
        .get("link")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("rel=\"next\""))
        .unwrap_or(false)
}

#[derive(Deserialize)]
struct ApiRelease {
    tag_name: String,
    published_at: Option<DateTime<Utc>>,
    target_commitish: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

impl From<ApiRelease> for ReleaseMetadata {
    fn from(r: ApiRelease) -> Self {
        ReleaseMetadata {
            tag: r.tag_name,
            published_at: r.published_at,
            target_commit: r.target_commitish,
        }
    }
}

#[derive(Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetails,
}

#[derive(Deserialize)]
struct ApiCommitDetails {
    message: String,
}

impl From<ApiCommit> for CommitRef {
    fn from(c: ApiCommit) -> Self {
        CommitRef {
            sha: c.sha,
            message: c.commit.message,
        }
    }
}

#[derive(Deserialize)]
struct ApiCompare {
    commits: Vec<ApiCommit>,
}

#[derive(Deserialize)]
struct ApiPull {
    number: u64,
    title: String,
    body: Option<String>,
    user: ApiUser,
    labels: Vec<ApiLabel>,
    html_url: String,
    #[serde(default)]
    additions: u32,
    #[serde(default)]
    deletions: u32,
    #[serde(default)]
    changed_files: u32,
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Deserialize)]
struct ApiLabel {
    name: String,
}

#[async_trait]
impl ReleaseHost for GitHubClient {
    async fn release_by_tag(&self, repo: &RepositoryRef, tag: &str) -> Result<ReleaseMetadata> {
        let url = format!(
            "{}/repos/{}/{}/releases/tags/{}",
            self.base_url, repo.owner, repo.name, tag
        );
        let response = self.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ReleaseNotFound {
                repo: repo.full_name(),
                tag: tag.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(self.fail_with_body(response, "release by tag").await);
        }

        let release: ApiRelease = response.json().await?;
        Ok(release.into())
    }

    async fn latest_release(&self, repo: &RepositoryRef) -> Result<ReleaseMetadata> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.base_url, repo.owner, repo.name
        );
        let response = self.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::ReleaseNotFound {
                repo: repo.full_name(),
                tag: "latest".to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(self.fail_with_body(response, "latest release").await);
        }

        let release: ApiRelease = response.json().await?;
        Ok(release.into())
    }

    async fn list_releases(
        &self,
        repo: &RepositoryRef,
        page: u32,
    ) -> Result<Page<ReleaseMetadata>> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={}&page={}",
            self.base_url, repo.owner, repo.name, PER_PAGE, page
        );
        let response = self.get(&url).await?;

        if !response.status().is_success() {
            return Err(self.fail_with_body(response, "list releases").await);
        }

        let has_next = has_next_page(&response);
        let releases: Vec<ApiRelease> = response.json().await?;
        let items = releases
            .into_iter()
            .filter(|r| !r.draft && !r.prerelease)
            .map(ReleaseMetadata::from)
            .collect();

        Ok(Page { items, has_next })
    }

    async fn compare_commits(
        &self,
        repo: &RepositoryRef,
        base: &str,
        head: &str,
        page: u32,
    ) -> Result<Page<CommitRef>> {
        let url = format!(
            "{}/repos/{}/{}/compare/{}...{}?per_page={}&page={}",
            self.base_url, repo.owner, repo.name, base, head, PER_PAGE, page
        );
        let response = self.get(&url).await?;

        if !response.status().is_success() {
            return Err(self.fail_with_body(response, "compare commits").await);
        }

        let has_next = has_next_page(&response);
        let comparison: ApiCompare = response.json().await?;
        let items = comparison.commits.into_iter().map(CommitRef::from).collect();

        Ok(Page { items, has_next })
    }

    async fn commits_from(
        &self,
        repo: &RepositoryRef,
        head: &str,
        page: u32,
    ) -> Result<Page<CommitRef>> {
        let url = format!(
            "{}/repos/{}/{}/commits?sha={}&per_page={}&page={}",
            self.base_url, repo.owner, repo.name, head, PER_PAGE, page
        );
        let response = self.get(&url).await?;

        if !response.status().is_success() {
            return Err(self.fail_with_body(response, "list commits").await);
        }

        let has_next = has_next_page(&response);
        let commits: Vec<ApiCommit> = response.json().await?;
        let items = commits.into_iter().map(CommitRef::from).collect();

        Ok(Page { items, has_next })
    }

    async fn pull_request(&self, repo: &RepositoryRef, number: u64) -> Result<Option<PRInfo>> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.base_url, repo.owner, repo.name, number
        );
        let response = self.get(&url).await?;

        if response.status() == StatusCode::NOT_FOUND {
            // The number referenced an issue or a PR in another repo.
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.fail_with_body(response, "pull request").await);
        }

        let pull: ApiPull = response.json().await?;
        let merged_at = match pull.merged_at {
            Some(t) => t,
            None => return Ok(None),
        };

        Ok(Some(PRInfo {
            number: pull.number,
            title: pull.title,
            body: pull.body,
            author: pull.user.login,
            labels: pull.labels.into_iter().map(|l| l.name).collect(),
            url: pull.html_url,
            additions: pull.additions,
            deletions: pull.deletions,
            changed_files: pull.changed_files,
            merged_at,
        }))
    }
}
