use std::env;
use std::time::Duration;

use crate::agent::AgentConfig;
use crate::error::{Error, Result};
use crate::fetcher::FetcherConfig;
use crate::summary::SummaryConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub anthropic_api_key: String,
    pub model: String,
    pub temperature: f32,
    pub deadline_secs: u64,
    pub max_prompt_prs: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let github_token = env::var("GITHUB_TOKEN")
            .map_err(|_| Error::Config("GITHUB_TOKEN environment variable not set".to_string()))?;

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            Error::Config("ANTHROPIC_API_KEY environment variable not set".to_string())
        })?;

        let model = env::var("RELEASELENS_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        let temperature = env::var("RELEASELENS_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.3);

        let deadline_secs = env::var("RELEASELENS_DEADLINE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);

        let max_prompt_prs = env::var("RELEASELENS_MAX_PROMPT_PRS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50);

        Ok(Self {
            github_token,
            anthropic_api_key,
            model,
            temperature,
            deadline_secs,
            max_prompt_prs,
        })
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            deadline: Duration::from_secs(self.deadline_secs),
            fetcher: FetcherConfig::default(),
            summary: SummaryConfig {
                model: self.model.clone(),
                temperature: self.temperature,
                max_prompt_prs: self.max_prompt_prs,
            },
        }
    }
}
