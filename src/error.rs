use std::time::Duration;

use thiserror::Error;

use crate::models::SummaryLevel;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown repository or shortcut: {0}")]
    UnknownRepository(String),

    #[error("Release {tag} not found for {repo}")]
    ReleaseNotFound { repo: String, tag: String },

    #[error("Rate limit exceeded, resets at epoch {reset_epoch}")]
    RateLimited { reset_epoch: u64 },

    #[error("Fetch failed after {attempts} attempts: {message}")]
    Fetch { attempts: u32, message: String },

    #[error("Could not generate {level} summary: {message}")]
    SummaryGeneration {
        level: SummaryLevel,
        message: String,
    },

    #[error("Deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("GitHub API error ({status}): {message}")]
    GitHubApi { status: u16, message: String },

    #[error("LLM API error ({status}): {message}")]
    LlmApi { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors worth retrying with backoff. Rate limits are excluded: the
    /// caller decides whether to wait for the reset.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::GitHubApi { status, .. } | Error::LlmApi { status, .. } => {
                *status >= 500 || *status == 429
            }
            _ => false,
        }
    }
}
