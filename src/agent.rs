//! The user-facing façade: free-form command in, formatted analysis out.
//!
//! Section ordering in the output is fixed: header, stats, per-category
//! PR breakdown, then any requested summary sections. A summary level
//! that failed is annotated inline instead of aborting the response.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::categorize::categorize;
use crate::error::{Error, Result};
use crate::fetcher::{FetcherConfig, ReleaseFetcher};
use crate::github::ReleaseHost;
use crate::llm::LLMProvider;
use crate::models::{
    ReleaseAnalysis, ReleaseDelta, ReleaseTagRequest, RepositoryRef, Shortcuts, SummaryBundle,
    SummaryLevel,
};
use crate::resolver;
use crate::summary::{SummaryConfig, SummaryOrchestrator};

const MAX_PRS_SHOWN_PER_CATEGORY: usize = 5;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Overall deadline for one `respond` or `compare_releases` call.
    pub deadline: Duration,
    pub fetcher: FetcherConfig,
    pub summary: SummaryConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(300),
            fetcher: FetcherConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

pub struct ReleaseAgent {
    host: Arc<dyn ReleaseHost>,
    fetcher: ReleaseFetcher,
    orchestrator: SummaryOrchestrator,
    shortcuts: Shortcuts,
    deadline: Duration,
}

impl ReleaseAgent {
    pub fn new(
        host: Arc<dyn ReleaseHost>,
        llm: Arc<dyn LLMProvider>,
        shortcuts: Shortcuts,
        config: AgentConfig,
    ) -> Self {
        Self {
            fetcher: ReleaseFetcher::new(host.clone(), config.fetcher),
            orchestrator: SummaryOrchestrator::new(llm, config.summary),
            host,
            shortcuts,
            deadline: config.deadline,
        }
    }

    /// Runs the full pipeline for a command like `js`, `server:v3.18.0`
    /// or `owner/repo tag` and formats the result. `levels` selects which
    /// summaries to generate; empty means analysis only.
    pub async fn respond(&self, command: &str, levels: &[SummaryLevel]) -> Result<String> {
        self.bounded(self.run(command, levels)).await
    }

    /// Analyzes two releases of the same repository and reports PR-count
    /// and per-category deltas. No summaries are generated.
    pub async fn compare_releases(
        &self,
        repo_or_shortcut: &str,
        tag_a: &str,
        tag_b: &str,
    ) -> Result<String> {
        self.bounded(self.run_comparison(repo_or_shortcut, tag_a, tag_b))
            .await
    }

    /// Renders the shortcut table with each repo's latest tag, best
    /// effort: a lookup failure never aborts listing the others.
    pub async fn list_known_repos(&self) -> String {
        let mut output = String::from("Known repositories:\n");
        for (shortcut, repo) in self.shortcuts.iter() {
            let latest = match self.host.latest_release(repo).await {
                Ok(release) => release.tag,
                Err(e) => {
                    tracing::debug!("Latest release lookup failed for {}: {}", repo, e);
                    "unknown".to_string()
                }
            };
            let _ = writeln!(output, "- {}: {} (latest: {})", shortcut, repo, latest);
        }
        output
    }

    async fn bounded<T>(&self, work: impl std::future::Future<Output = Result<T>>) -> Result<T> {
        match timeout(self.deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.deadline)),
        }
    }

    async fn run(&self, command: &str, levels: &[SummaryLevel]) -> Result<String> {
        let (repo, request) = resolver::resolve(command, &self.shortcuts)?;
        let analysis = self.analyze(&repo, &request).await?;

        let bundle = if levels.is_empty() {
            None
        } else {
            Some(self.orchestrator.summarize(&analysis, levels).await)
        };

        Ok(format_analysis(&analysis, levels, bundle.as_ref()))
    }

    async fn run_comparison(&self, repo_or_shortcut: &str, tag_a: &str, tag_b: &str) -> Result<String> {
        let (repo, _) = resolver::resolve(repo_or_shortcut, &self.shortcuts)?;
        let a = self
            .analyze(&repo, &ReleaseTagRequest::Tag(tag_a.to_string()))
            .await?;
        let b = self
            .analyze(&repo, &ReleaseTagRequest::Tag(tag_b.to_string()))
            .await?;
        let delta = ReleaseDelta::between(&a, &b);
        Ok(format_comparison(&a, &b, &delta))
    }

    async fn analyze(
        &self,
        repo: &RepositoryRef,
        request: &ReleaseTagRequest,
    ) -> Result<ReleaseAnalysis> {
        let analysis = self.fetcher.fetch(repo, request).await?;
        let categories = categorize(&analysis.prs);
        Ok(analysis.with_categories(categories))
    }
}

fn format_analysis(
    analysis: &ReleaseAnalysis,
    levels: &[SummaryLevel],
    bundle: Option<&SummaryBundle>,
) -> String {
    let stats = analysis.stats();
    let mut output = format!(
        "=== Release Analysis: {} - {} ===\n",
        analysis.repo, analysis.metadata.tag
    );

    output.push_str("\nStats:\n");
    let _ = writeln!(output, "- Total PRs: {}", stats.total_prs);
    let _ = writeln!(
        output,
        "- Release date: {}",
        analysis
            .metadata
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    );
    let _ = writeln!(
        output,
        "- Lines: +{}/-{} across {} files",
        stats.additions, stats.deletions, stats.changed_files
    );
    let _ = writeln!(output, "- Contributors: {}", stats.contributors);

    output.push_str("\nPR Breakdown:\n");
    if analysis.prs.is_empty() {
        output.push_str("(no PRs found in this release)\n");
    }
    for (category, prs) in &analysis.categories {
        if prs.is_empty() {
            continue;
        }
        let _ = writeln!(output, "\n{} ({} PRs):", category, prs.len());
        for pr in prs.iter().take(MAX_PRS_SHOWN_PER_CATEGORY) {
            let _ = writeln!(output, "- #{}: {} (@{})", pr.number, pr.title, pr.author);
        }
        if prs.len() > MAX_PRS_SHOWN_PER_CATEGORY {
            let _ = writeln!(
                output,
                "- ... and {} more",
                prs.len() - MAX_PRS_SHOWN_PER_CATEGORY
            );
        }
    }

    if let Some(bundle) = bundle {
        for level in levels {
            let title = match level {
                SummaryLevel::Executive => "Executive Summary",
                SummaryLevel::Product => "Product Summary",
                SummaryLevel::Developer => "Developer Summary",
            };
            match bundle.get(*level) {
                Some(text) => {
                    let _ = write!(output, "\n{}:\n{}\n", title, text);
                }
                None => {
                    let reason = bundle
                        .failures
                        .iter()
                        .find(|(l, _)| l == level)
                        .map(|(_, msg)| msg.as_str())
                        .unwrap_or("not generated");
                    let _ = writeln!(output, "\n{} unavailable: {}", title, reason);
                }
            }
        }
    }

    output
}

fn format_comparison(a: &ReleaseAnalysis, b: &ReleaseAnalysis, delta: &ReleaseDelta) -> String {
    let mut output = format!(
        "=== Release Comparison: {} ===\n\n{} vs {}\n\n",
        a.repo, a.metadata.tag, b.metadata.tag
    );

    let _ = writeln!(
        output,
        "- Total PRs: {} vs {} ({:+})",
        a.total_prs(),
        b.total_prs(),
        delta.total_prs
    );

    output.push_str("\nBy category:\n");
    for (category, change) in &delta.by_category {
        let count_a = a.categories.get(category).map_or(0, |prs| prs.len());
        let count_b = b.categories.get(category).map_or(0, |prs| prs.len());
        let _ = writeln!(
            output,
            "- {}: {} vs {} ({:+})",
            category, count_a, count_b, change
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CommitRef};
    use crate::testutil::{pr, release, MockHost, MockLlm};

    fn agent(host: MockHost) -> ReleaseAgent {
        ReleaseAgent::new(
            Arc::new(host),
            Arc::new(MockLlm::new()),
            Shortcuts::prebid(),
            AgentConfig::default(),
        )
    }

    fn commit(message: &str) -> CommitRef {
        CommitRef {
            sha: "deadbeef".into(),
            message: message.into(),
        }
    }

    // Shortcut `js`, latest release, three PRs: one bug label, one feature
    // label, one unlabeled with a dependency-flavored title.
    #[tokio::test]
    async fn shortcut_latest_release_end_to_end() {
        let host = MockHost::new()
            .releases(vec![release("9.49.1", "head"), release("9.49.0", "base")])
            .commit_pages(vec![vec![commit("(#1) (#2) (#3)")]])
            .pull(pr(1, "Fix overlay sizing", &["bug"]))
            .pull(pr(2, "Add bid adapter", &["feature"]))
            .pull(pr(3, "Update deps", &[]));

        let output = agent(host).respond("js", &[]).await.unwrap();

        assert!(output.contains("prebid/Prebid.js - 9.49.1"));
        assert!(output.contains("- Total PRs: 3"));
        assert!(output.contains("Bug Fixes (1 PRs):"));
        assert!(output.contains("Features (1 PRs):"));
        assert!(output.contains("Dependencies (1 PRs):"));
        assert!(output.contains("#3: Update deps (@dev3)"));
    }

    #[tokio::test]
    async fn output_sections_keep_fixed_order() {
        let host = MockHost::new()
            .releases(vec![release("v2.0.0", "head"), release("v1.0.0", "base")])
            .commit_pages(vec![vec![commit("(#1)")]])
            .pull(pr(1, "Fix crash", &["bug"]));

        let output = agent(host)
            .respond("server:v2.0.0", &[SummaryLevel::Executive])
            .await
            .unwrap();

        let stats = output.find("Stats:").unwrap();
        let breakdown = output.find("PR Breakdown:").unwrap();
        let summary = output.find("Executive Summary").unwrap();
        assert!(stats < breakdown && breakdown < summary);
    }

    #[tokio::test]
    async fn failed_summary_level_is_annotated_not_fatal() {
        let host = MockHost::new()
            .releases(vec![release("v2.0.0", "head"), release("v1.0.0", "base")])
            .commit_pages(vec![vec![commit("(#1)")]])
            .pull(pr(1, "Fix crash", &["bug"]));
        let agent = ReleaseAgent::new(
            Arc::new(host),
            Arc::new(MockLlm::new().fail_prompts_containing("executive audience")),
            Shortcuts::prebid(),
            AgentConfig::default(),
        );

        let output = agent
            .respond("server:v2.0.0", &[SummaryLevel::Executive, SummaryLevel::Product])
            .await
            .unwrap();

        assert!(output.contains("Executive Summary unavailable:"));
        assert!(output.contains("Product Summary:\n"));
    }

    #[tokio::test]
    async fn missing_release_aborts_before_summaries() {
        let host = MockHost::new().releases(vec![release("v1.0.0", "head")]);
        let llm = Arc::new(MockLlm::new());
        let agent = ReleaseAgent::new(
            Arc::new(host),
            llm.clone(),
            Shortcuts::prebid(),
            AgentConfig::default(),
        );

        let err = agent
            .respond("nonexistent/repo:v1.0.0", &[SummaryLevel::Executive])
            .await
            .unwrap_err();

        // `nonexistent/repo` passes the owner/repo pattern check, so the
        // failure comes from release lookup, before any LLM call.
        assert!(matches!(err, Error::ReleaseNotFound { .. }));
        assert!(llm.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn compare_releases_reports_category_deltas() {
        // v3.17.0 window: PRs 1-10 (5 features); v3.18.0 window: PRs
        // 11-28 (8 features).
        let mut host = MockHost::new().releases(vec![
            release("v3.18.0", "c3"),
            release("v3.17.0", "c2"),
            release("v3.16.0", "c1"),
        ]);

        let mut window_a = String::new();
        for n in 1..=10 {
            window_a.push_str(&format!("(#{}) ", n));
        }
        let mut window_b = String::new();
        for n in 11..=28 {
            window_b.push_str(&format!("(#{}) ", n));
        }
        host = host
            .window("v3.16.0", "v3.17.0", vec![vec![commit(&window_a)]])
            .window("v3.17.0", "v3.18.0", vec![vec![commit(&window_b)]]);

        for n in 1..=10u64 {
            let labels = if n <= 5 { ["feature"] } else { ["bug"] };
            host = host.pull(pr(n, "change", &labels));
        }
        for n in 11..=28u64 {
            let labels = if n <= 18 { ["feature"] } else { ["bug"] };
            host = host.pull(pr(n, "change", &labels));
        }

        let output = agent(host)
            .compare_releases("server", "v3.17.0", "v3.18.0")
            .await
            .unwrap();

        assert!(output.contains("- Total PRs: 10 vs 18 (+8)"));
        assert!(output.contains("- Features: 5 vs 8 (+3)"));
        assert!(output.contains("- Bug Fixes: 5 vs 10 (+5)"));
    }

    #[tokio::test]
    async fn list_known_repos_survives_lookup_failures() {
        // No releases at all: every latest lookup fails, listing still
        // covers the whole table.
        let output = agent(MockHost::new()).list_known_repos().await;
        for shortcut in ["js", "server", "server-java", "ios", "android"] {
            assert!(output.contains(&format!("- {}:", shortcut)));
        }
        assert!(output.contains("(latest: unknown)"));
    }

    #[tokio::test]
    async fn list_known_repos_annotates_latest_tags() {
        let host = MockHost::new().releases(vec![release("v4.2.0", "head")]);
        let output = agent(host).list_known_repos().await;
        assert!(output.contains("(latest: v4.2.0)"));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_surfaces_timeout() {
        let host = MockHost::new()
            .releases(vec![release("v1.0.0", "head")])
            .delay(Duration::from_secs(600));
        let agent = ReleaseAgent::new(
            Arc::new(host),
            Arc::new(MockLlm::new()),
            Shortcuts::prebid(),
            AgentConfig {
                deadline: Duration::from_secs(30),
                ..AgentConfig::default()
            },
        );

        let err = agent.respond("server", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }

    #[tokio::test]
    async fn empty_release_renders_without_summaries_or_prs() {
        let host = MockHost::new()
            .releases(vec![release("v2.0.0", "head"), release("v1.0.0", "base")])
            .commit_pages(vec![vec![]]);

        let output = agent(host).respond("server:v2.0.0", &[]).await.unwrap();
        assert!(output.contains("- Total PRs: 0"));
        assert!(output.contains("(no PRs found in this release)"));
        assert!(!output.contains("Summary"));
    }

    #[test]
    fn delta_covers_categories_from_either_release() {
        use crate::categorize::categorize;

        let a_prs = vec![pr(1, "x", &["bug"])];
        let b_prs = vec![pr(2, "y", &["docs"])];
        let a = ReleaseAnalysis {
            repo: RepositoryRef::parse("acme/widgets").unwrap(),
            metadata: release("v1", "c1"),
            categories: categorize(&a_prs),
            prs: a_prs,
        };
        let b = ReleaseAnalysis {
            repo: a.repo.clone(),
            metadata: release("v2", "c2"),
            categories: categorize(&b_prs),
            prs: b_prs,
        };

        let delta = ReleaseDelta::between(&a, &b);
        assert_eq!(delta.by_category[&Category::BugFixes], -1);
        assert_eq!(delta.by_category[&Category::Documentation], 1);
        assert!(!delta.by_category.contains_key(&Category::Tests));
    }
}
