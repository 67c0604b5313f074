//! Level-scoped prompt builders. Each summary level sees a different
//! rendering of the same analysis: executives get aggregates only,
//! product gets per-PR business framing inputs, developers get change
//! stats and breaking-change signals.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::models::{PRInfo, ReleaseAnalysis};

const PRODUCT_EXCERPT_CHARS: usize = 300;
const DEVELOPER_EXCERPT_CHARS: usize = 500;

/// Aggregate-stats-only prompt. No per-PR detail by design: the numbers
/// always reflect the full PR set even when other levels are truncated.
pub fn executive(analysis: &ReleaseAnalysis) -> String {
    let stats = analysis.stats();
    let mut prompt = format!(
        "Summarize this software release for an executive audience.\n\n\
         Repository: {}\nRelease Tag: {}\nRelease Date: {}\nTotal PRs: {}\n",
        analysis.repo,
        analysis.metadata.tag,
        analysis
            .metadata
            .published_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        stats.total_prs,
    );

    prompt.push_str("\nChanges by category:\n");
    for (category, count) in &stats.category_counts {
        if *count > 0 {
            let _ = writeln!(prompt, "- {}: {} PRs", category, count);
        }
    }
    if let Some(top) = stats.top_category {
        let _ = writeln!(prompt, "Largest category: {}", top);
    }

    let _ = write!(
        prompt,
        "\nScale:\n- Lines added: {}\n- Lines deleted: {}\n- Files changed: {}\n- Contributors: {}\n\n\
         Write a 1-2 paragraph strategic narrative of this release: what it delivers, \
         where the effort went, and the overall direction it signals. Professional but \
         accessible, suitable for release notes.",
        stats.additions, stats.deletions, stats.changed_files, stats.contributors,
    );

    prompt
}

/// Per-PR product framing: number, title, category, author, plus a short
/// description excerpt when available.
pub fn product(analysis: &ReleaseAnalysis, prs: &[&PRInfo]) -> String {
    let mut prompt = format!(
        "Analyze this software release from a PRODUCT MANAGER perspective.\n\n\
         Repository: {}\nRelease Tag: {}\nTotal PRs: {}\n\nPRs by category:\n",
        analysis.repo,
        analysis.metadata.tag,
        prs.len(),
    );

    render_by_category(&mut prompt, analysis, prs, |prompt, pr| {
        let _ = writeln!(prompt, "- #{}: {} by @{}", pr.number, pr.title, pr.author);
        if let Some(excerpt) = pr.body_excerpt(PRODUCT_EXCERPT_CHARS) {
            let _ = writeln!(prompt, "  Description: {}", excerpt);
        }
    });

    prompt.push_str(
        "\nFor each PR describe the user or business impact and its relative importance. \
         Group the discussion by category and call out user-facing changes. Suitable for \
         product managers and stakeholders.",
    );
    prompt
}

/// Per-PR technical framing: change stats, labels, and an explicit
/// breaking-change flag mined from labels and titles.
pub fn developer(analysis: &ReleaseAnalysis, prs: &[&PRInfo]) -> String {
    let mut prompt = format!(
        "Analyze this software release from a DEVELOPER perspective.\n\n\
         Repository: {}\nRelease Tag: {}\nTotal PRs: {}\n\nPRs by category:\n",
        analysis.repo,
        analysis.metadata.tag,
        prs.len(),
    );

    render_by_category(&mut prompt, analysis, prs, |prompt, pr| {
        let _ = writeln!(prompt, "- #{}: {} by @{}", pr.number, pr.title, pr.author);
        if let Some(excerpt) = pr.body_excerpt(DEVELOPER_EXCERPT_CHARS) {
            let _ = writeln!(prompt, "  Description: {}", excerpt);
        }
        let _ = writeln!(
            prompt,
            "  Stats: +{}/-{} lines across {} files",
            pr.additions, pr.deletions, pr.changed_files
        );
        if !pr.labels.is_empty() {
            let _ = writeln!(prompt, "  Labels: {}", pr.labels.join(", "));
        }
        if pr.is_breaking() {
            prompt.push_str("  POSSIBLE BREAKING CHANGE\n");
        }
    });

    prompt.push_str(
        "\nFor each PR describe the technical impact: implementation and architecture \
         changes, migration requirements for anything flagged as a possible breaking \
         change, and testing implications. Suitable for developers and technical leads.",
    );
    prompt
}

fn render_by_category(
    prompt: &mut String,
    analysis: &ReleaseAnalysis,
    prs: &[&PRInfo],
    mut render_pr: impl FnMut(&mut String, &PRInfo),
) {
    let included: BTreeSet<u64> = prs.iter().map(|pr| pr.number).collect();

    for (category, category_prs) in &analysis.categories {
        let selected: Vec<&PRInfo> = category_prs
            .iter()
            .filter(|pr| included.contains(&pr.number))
            .collect();
        if selected.is_empty() {
            continue;
        }

        let _ = writeln!(prompt, "\n{} ({} PRs):", category, selected.len());
        for pr in selected {
            render_pr(prompt, pr);
        }
    }
}
