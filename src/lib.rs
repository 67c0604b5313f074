pub mod agent;
pub mod categorize;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod github;
pub mod llm;
pub mod models;
pub mod resolver;
pub mod summary;

#[cfg(test)]
pub(crate) mod testutil;

pub use agent::{AgentConfig, ReleaseAgent};
pub use config::Config;
pub use error::{Error, Result};
pub use fetcher::{FetcherConfig, ReleaseFetcher};
pub use github::GitHubClient;
pub use llm::{ClaudeProvider, LLMProvider};
pub use summary::{SummaryConfig, SummaryOrchestrator};
