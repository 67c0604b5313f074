pub mod claude;
pub mod prompts;
pub mod provider;

pub use claude::ClaudeProvider;
pub use provider::{GenerationParams, LLMProvider};
