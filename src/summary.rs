//! Coordinates the per-level LLM calls over one read-only analysis.
//!
//! Levels are independent: they run concurrently, each transient provider
//! error is retried once, and a level that still fails stays absent from
//! the bundle without touching the others.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::{Error, Result};
use crate::llm::{prompts, GenerationParams, LLMProvider};
use crate::models::{PRInfo, ReleaseAnalysis, SummaryBundle, SummaryLevel};

#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub model: String,
    pub temperature: f32,
    /// Above this PR count, product and developer prompts cover only the
    /// most recently merged PRs. Executive stats always cover everything.
    pub max_prompt_prs: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            temperature: 0.3,
            max_prompt_prs: 50,
        }
    }
}

pub struct SummaryOrchestrator {
    llm: Arc<dyn LLMProvider>,
    config: SummaryConfig,
}

impl SummaryOrchestrator {
    pub fn new(llm: Arc<dyn LLMProvider>, config: SummaryConfig) -> Self {
        Self { llm, config }
    }

    pub async fn summarize(
        &self,
        analysis: &ReleaseAnalysis,
        levels: &[SummaryLevel],
    ) -> SummaryBundle {
        let mut requested: Vec<SummaryLevel> = Vec::new();
        for level in levels {
            if !requested.contains(level) {
                requested.push(*level);
            }
        }

        let results = join_all(
            requested
                .iter()
                .map(|level| async move { (*level, self.generate_level(analysis, *level).await) }),
        )
        .await;

        let mut bundle = SummaryBundle::default();
        for (level, result) in results {
            match result {
                Ok(text) => bundle.set(level, text),
                Err(e) => {
                    tracing::warn!("{} summary failed: {}", level, e);
                    bundle.failures.push((level, e.to_string()));
                }
            }
        }
        bundle
    }

    async fn generate_level(
        &self,
        analysis: &ReleaseAnalysis,
        level: SummaryLevel,
    ) -> Result<String> {
        let (subset, subset_note) = self.level_prs(analysis, level);
        let prompt = match level {
            SummaryLevel::Executive => prompts::executive(analysis),
            SummaryLevel::Product => prompts::product(analysis, &subset),
            SummaryLevel::Developer => prompts::developer(analysis, &subset),
        };
        let params = GenerationParams {
            model: self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens: match level {
                SummaryLevel::Executive => 1024,
                SummaryLevel::Product => 2048,
                SummaryLevel::Developer => 4096,
            },
        };

        let mut result = self.llm.generate(&prompt, &params).await;
        if matches!(&result, Err(e) if e.is_transient()) {
            tracing::warn!("{} summary hit a transient provider error, retrying once", level);
            result = self.llm.generate(&prompt, &params).await;
        }

        match result {
            Ok(mut text) => {
                if let Some(note) = subset_note {
                    text.push_str("\n\n");
                    text.push_str(&note);
                }
                Ok(text)
            }
            Err(e) => Err(Error::SummaryGeneration {
                level,
                message: e.to_string(),
            }),
        }
    }

    /// The PRs a level's prompt may reference, and the subset note when the
    /// set had to be truncated.
    fn level_prs<'a>(
        &self,
        analysis: &'a ReleaseAnalysis,
        level: SummaryLevel,
    ) -> (Vec<&'a PRInfo>, Option<String>) {
        let all: Vec<&PRInfo> = analysis.prs.iter().collect();
        if level == SummaryLevel::Executive || all.len() <= self.config.max_prompt_prs {
            return (all, None);
        }

        let mut by_recency = all;
        by_recency.sort_by(|a, b| b.merged_at.cmp(&a.merged_at));
        by_recency.truncate(self.config.max_prompt_prs);

        let note = format!(
            "Note: this summary covers the {} most recently merged PRs of {} total.",
            self.config.max_prompt_prs,
            analysis.total_prs(),
        );
        (by_recency, Some(note))
    }
}
